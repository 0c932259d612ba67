use anyhow::Context;

fn main() -> anyhow::Result<()> {
    choreboard::run().context("choreboard command failed")
}
