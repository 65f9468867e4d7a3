use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // Every file here gets a server implementation generated
    let proto_files = &["proto/demo.proto", "proto/types.proto"];

    // Name of the folder containing the proto definitions
    let proto_folder = "proto";

    // Compiled in-process so the fixture builds without a `protoc` binary.
    let file_descriptor_set = protox::compile(proto_files, [proto_folder])?;

    tonic_prost_build::configure()
        .build_client(false)
        .compile_fds(file_descriptor_set)?;

    println!("cargo:rerun-if-changed={proto_folder}");

    Ok(())
}
