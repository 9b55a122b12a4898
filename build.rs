//! Generates the `cedar.CedarSystemMetrics` gRPC stubs when the `grpc`
//! feature is on. Messages are hand-declared in `src/rpc/mod.rs`, so no
//! `protoc` is needed.

fn main() {
    #[cfg(feature = "grpc")]
    generate_grpc();
}

#[cfg(feature = "grpc")]
fn generate_grpc() {
    use tonic_build::manual::{Builder, Method, Service};

    let method = |name: &str, route: &str| {
        Method::builder()
            .name(name)
            .route_name(route)
            .input_type("crate::rpc::SystemMetricsData")
            .output_type("crate::rpc::SystemMetricsResponse")
            .codec_path("tonic::codec::ProstCodec")
    };

    let service = Service::builder()
        .name("CedarSystemMetrics")
        .package("cedar")
        .method(method("add_system_metrics", "AddSystemMetrics").build())
        .method(
            method("stream_system_metrics", "StreamSystemMetrics")
                .client_streaming()
                .build(),
        )
        .build();

    Builder::new().compile(&[service]);
    println!("cargo:rerun-if-changed=build.rs");
}
