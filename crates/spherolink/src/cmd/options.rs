use serde::Serialize;
use spherolink_device::PermanentOptions;

use crate::cmd::OptionsArgs;
use crate::exit::{reply, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_record, OutputFormat};

#[derive(Serialize)]
struct OptionsOutput {
    bits: u64,
    flags: Vec<&'static str>,
}

pub fn run(args: OptionsArgs, format: OutputFormat) -> CliResult<i32> {
    let enable = parse_flags(&args.enable)?;
    let disable = parse_flags(&args.disable)?;

    let device = args.connect.connect()?;
    let mut options = reply("options query failed", device.get_permanent_options())?;

    if !enable.is_empty() || !disable.is_empty() {
        options.insert(enable);
        options.remove(disable);
        reply(
            "set options failed",
            device.set_permanent_options(options),
        )?;
    }
    device.close();

    let out = OptionsOutput {
        bits: options.bits(),
        flags: options.names(),
    };
    let rows = [
        ("bits", format!("{:#018x}", out.bits)),
        ("flags", out.flags.join(", ").to_lowercase()),
    ];
    print_record(&out, &rows, format);
    Ok(SUCCESS)
}

fn parse_flags(names: &[String]) -> CliResult<PermanentOptions> {
    names.iter().try_fold(PermanentOptions::empty(), |acc, name| {
        let wanted = name.trim().replace('-', "_").to_ascii_uppercase();
        PermanentOptions::from_name(&wanted)
            .map(|flag| acc | flag)
            .ok_or_else(|| CliError::new(USAGE, format!("unknown option flag: {name}")))
    })
}
