/// Packaging helper. `nih_plug_xtask` provides the `bundle` subcommand:
///
///   cargo xtask bundle loveless-delay-v2 --release
///
/// builds the cdylib and lays out `target/bundled/` with the `.clap` and
/// `.vst3` bundles for Loveless Delay II.
fn main() -> nih_plug_xtask::Result<()> {
    nih_plug_xtask::main()
}
