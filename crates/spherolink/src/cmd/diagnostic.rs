use crate::cmd::ConnectArgs;
use crate::exit::{reply, CliResult, SUCCESS};

pub fn run(args: ConnectArgs) -> CliResult<i32> {
    let device = args.connect()?;
    let dump = reply("diagnostic failed", device.l1_diagnostic())?;
    device.close();
    print!("{dump}");
    if !dump.ends_with('\n') {
        println!();
    }
    Ok(SUCCESS)
}
