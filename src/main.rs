use clap::Parser;
use waypost::Config;

fn main() -> anyhow::Result<()> {
    waypost::run(Config::parse())
}
