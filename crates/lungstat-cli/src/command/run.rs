use crate::command::{
    describe::write_descriptive,
    survival::{SurvivalArg, write_survival},
};

/// Every analysis reads the same arguments as `survival`.
pub(crate) type RunArg = SurvivalArg;

pub(crate) fn run(arg: &RunArg) -> anyhow::Result<()> {
    let data = arg.input.load()?;
    let dir = arg.input.output_dir()?;

    println!("Descriptive Table");
    println!("=================\n");
    write_descriptive(&data, &dir)?;
    println!();

    println!("Survival Analysis");
    println!("=================\n");
    write_survival(&data, &dir, arg.alpha)?;

    tracing::info!(output_dir = %dir.path().display(), "all outputs written");
    Ok(())
}
