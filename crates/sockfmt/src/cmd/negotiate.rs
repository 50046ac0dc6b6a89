use serde::Serialize;
use sockfmt_frame::{get_format_from_content_type, get_format_from_indicator, MessageFormat};

use crate::cmd::NegotiateArgs;
use crate::exit::{frame_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct NegotiateOutput {
    format: &'static str,
    indicator: String,
    content_type: &'static str,
}

impl From<MessageFormat> for NegotiateOutput {
    fn from(format: MessageFormat) -> Self {
        Self {
            format: match format {
                MessageFormat::Text => "text",
                MessageFormat::Binary => "binary",
            },
            indicator: char::from(format.indicator()).to_string(),
            content_type: format.content_type(),
        }
    }
}

pub fn run(args: NegotiateArgs, format: OutputFormat) -> CliResult<i32> {
    let resolved = resolve(&args)?;
    let out = NegotiateOutput::from(resolved);

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("format: {}", out.format);
            println!("indicator: {}", out.indicator);
            println!("content_type: {}", out.content_type);
        }
        OutputFormat::Raw => println!("{}", out.format),
    }

    Ok(SUCCESS)
}

fn resolve(args: &NegotiateArgs) -> CliResult<MessageFormat> {
    if let Some(indicator) = args.indicator {
        let byte = u8::try_from(indicator).map_err(|_| {
            CliError::new(
                DATA_INVALID,
                format!("invalid format indicator: {indicator:?}"),
            )
        })?;
        return get_format_from_indicator(byte)
            .map_err(|err| frame_error("negotiate failed", err))
            .map_err(as_data_invalid);
    }
    if let Some(content_type) = &args.content_type {
        return get_format_from_content_type(content_type)
            .map_err(|err| frame_error("negotiate failed", err))
            .map_err(as_data_invalid);
    }
    Err(CliError::new(
        USAGE,
        "either --indicator or --content-type is required",
    ))
}

fn as_data_invalid(mut err: CliError) -> CliError {
    if err.code == USAGE {
        err.code = DATA_INVALID;
    }
    err
}
