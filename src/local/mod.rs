pub mod export;

pub use export::{
    metadata_path, read_metadata, read_tensor_csv, write_metadata, write_tensor_csv,
    TensorMetadata,
};
