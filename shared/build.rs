use std::{env, path::PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    // Messages are declared with prost derives in src/proto.rs, so only the
    // service stubs are generated here and no protoc is needed.
    let predictor = tonic_build::manual::Service::builder()
        .name("Predictor")
        .package("plant")
        .comment("Plant leaf disease classifier")
        .method(
            tonic_build::manual::Method::builder()
                .name("predict")
                .route_name("Predict")
                .input_type("crate::proto::PredictorRequest")
                .output_type("crate::proto::PredictorReply")
                .codec_path("tonic::codec::ProstCodec")
                .build(),
        )
        .build();

    tonic_build::manual::Builder::new()
        .out_dir(out_dir)
        .compile(&[predictor]);

    println!("cargo:rerun-if-changed=build.rs");
    Ok(())
}
