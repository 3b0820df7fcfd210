fn main() -> anyhow::Result<()> {
    smdforge::cli::run_cli()
}
