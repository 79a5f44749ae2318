use crate::cli::EnergyArgs;
use crate::error::Result;
use sitegen::workflows::energy;

pub fn run(args: EnergyArgs) -> Result<()> {
    let name = args
        .combined
        .file_name()
        .map(|n| energy::record_name(&n.to_string_lossy()).to_string())
        .unwrap_or_default();
    let record = energy::compute(
        &name,
        &args.combined,
        &args.references.surface,
        &args.references.adsorbate,
        args.references.multiplier,
    )?;

    println!("{}", record.name);
    println!("  combined            {:>16.8}", record.combined);
    println!("  surface             {:>16.8}", record.surface);
    println!(
        "  adsorbate (x{})     {:>16.8}",
        args.references.multiplier, record.adsorbate
    );
    println!("  adsorption energy   {:>16.8}", record.adsorption_energy);
    Ok(())
}
