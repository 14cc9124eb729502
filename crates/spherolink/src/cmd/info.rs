use serde::Serialize;
use spherolink_device::{BluetoothInfo, Versioning};

use crate::cmd::ConnectArgs;
use crate::exit::{reply, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

#[derive(Serialize)]
struct InfoOutput {
    versioning: Versioning,
    bluetooth: BluetoothInfo,
    chassis_id: Option<u16>,
}

pub fn run(args: ConnectArgs, format: OutputFormat) -> CliResult<i32> {
    let device = args.connect()?;
    let versioning = reply("versioning query failed", device.get_versioning())?;
    let bluetooth = reply("bluetooth query failed", device.get_bluetooth_info())?;
    // Older firmware answers get-chassis-id with an unknown-command status.
    let chassis_id = device.get_chassis_id().ok().and_then(Result::ok);
    device.close();

    let rows = [
        ("name", bluetooth.name.clone()),
        ("address", bluetooth.address.clone()),
        ("model", versioning.model.to_string()),
        ("hardware", versioning.hardware.to_string()),
        (
            "main app",
            format!(
                "{}.{}",
                versioning.main_app_version, versioning.main_app_revision
            ),
        ),
        ("bootloader", format!("{:#04x}", versioning.bootloader)),
        (
            "chassis id",
            chassis_id.map_or_else(|| "unavailable".to_string(), |id| id.to_string()),
        ),
    ];
    let out = InfoOutput {
        versioning,
        bluetooth,
        chassis_id,
    };
    print_record(&out, &rows, format);
    Ok(SUCCESS)
}
