use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("sockfmt {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: sockfmt");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("SOCKFMT_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("wire_formats: binary, text, sse");
    println!("max_message_size: {}", sockfmt_frame::MAX_MESSAGE_SIZE);
    println!("features: async={}, cli=true", cfg!(feature = "async"));

    Ok(SUCCESS)
}
