fn main() -> color_eyre::eyre::Result<()> {
    sql2cypher::cli::main()
}
