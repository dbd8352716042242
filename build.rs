use vergen_git2::{BuildBuilder, CargoBuilder, Emitter, Git2Builder};

/// Emits `VERGEN_*` variables for `gnss_tracker::version`. Outside a git
/// checkout vergen writes placeholders and the crate version is used instead.
pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Migrations are embedded with `embed_migrations!`
    println!("cargo:rerun-if-changed=migrations");

    let build = BuildBuilder::default().build_timestamp(true).build()?;
    let cargo = CargoBuilder::default().target_triple(true).build()?;
    let git2 = Git2Builder::default()
        .describe(true, true, None)
        .sha(true)
        .build()?;

    Emitter::default()
        .add_instructions(&build)?
        .add_instructions(&cargo)?
        .add_instructions(&git2)?
        .emit()?;
    Ok(())
}
