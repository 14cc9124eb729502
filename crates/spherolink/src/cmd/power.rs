use crate::cmd::ConnectArgs;
use crate::exit::{reply, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

pub fn run(args: ConnectArgs, format: OutputFormat) -> CliResult<i32> {
    let device = args.connect()?;
    let state = reply("power query failed", device.get_power_state())?;
    device.close();

    let rows = [
        ("level", state.level.to_string()),
        ("battery", format!("{:.2}V", state.battery_volts())),
        ("charges", state.charge_count.to_string()),
        ("since charge", format!("{}s", state.seconds_since_charge)),
    ];
    print_record(&state, &rows, format);
    Ok(SUCCESS)
}
