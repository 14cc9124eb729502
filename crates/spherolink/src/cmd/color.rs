use crate::cmd::ColorArgs;
use crate::exit::{reply, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

pub fn run(args: ColorArgs, format: OutputFormat) -> CliResult<i32> {
    let device = args.connect.connect()?;

    let color = match args.color {
        Some(color) => {
            reply("set color failed", device.set_color(color, args.persist))?;
            color
        }
        None => reply("color query failed", device.get_color())?,
    };
    device.close();

    let rows = [(
        "color",
        format!("#{:02X}{:02X}{:02X}", color.red, color.green, color.blue),
    )];
    print_record(&color, &rows, format);
    Ok(SUCCESS)
}
