mod command;
mod logging;
mod plot;
mod print;
mod util;

fn main() -> anyhow::Result<()> {
    command::run()
}
