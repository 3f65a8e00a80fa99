pub mod lamports;
