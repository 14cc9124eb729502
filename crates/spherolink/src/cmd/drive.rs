use std::thread;

use crate::cmd::{parse_duration, HeadingArgs, RollArgs};
use crate::exit::{device_error, reply, CliResult, SUCCESS};

pub fn roll(args: RollArgs) -> CliResult<i32> {
    let duration = parse_duration(&args.duration)?;
    let device = args.connect.connect()?;

    device
        .roll(args.speed, args.heading, args.fast_rotate)
        .map_err(|err| device_error("roll failed", err))?;
    thread::sleep(duration);
    device
        .stop()
        .map_err(|err| device_error("stop failed", err))?;
    device.close();
    Ok(SUCCESS)
}

pub fn heading(args: HeadingArgs) -> CliResult<i32> {
    let device = args.connect.connect()?;
    reply("set heading failed", device.set_heading(args.degrees))?;
    device.close();
    Ok(SUCCESS)
}
