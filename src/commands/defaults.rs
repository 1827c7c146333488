use super::Error;
use crate::cmd::Defaults;
use crate::manager::CredsManager;

pub fn exec_default(manager: &CredsManager, subcommand: Defaults) -> Result<(), Error> {
    let defaults = match subcommand {
        Defaults::Get => manager.defaults().get()?,
        Defaults::Set { output, region } => manager
            .defaults()
            .set(output.as_deref().map(str::trim), region.as_deref().map(str::trim))?,
    };
    println!("output: {}", defaults.output);
    println!("region: {}", defaults.region);
    Ok(())
}
