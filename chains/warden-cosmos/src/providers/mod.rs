pub use grpc::*;

mod grpc;
