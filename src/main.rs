fn main() -> anyhow::Result<()> {
    gwena_go::run()
}
