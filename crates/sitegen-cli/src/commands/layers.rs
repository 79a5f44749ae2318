use crate::cli::LayersArgs;
use crate::error::Result;
use sitegen::engine::layers::{classify_layer, layer_heights};
use sitegen::workflows::generate::read_structure;
use tracing::info;

pub fn run(args: LayersArgs) -> Result<()> {
    let structure = read_structure(&args.input)?;
    let heights = layer_heights(&structure, &args.species)?;
    info!(
        species = %args.species,
        layers = heights.len(),
        "Classified layers."
    );

    let layer = classify_layer(&structure, &args.species, args.layer)?;
    println!(
        "{} layer(s) of {} starting at z = {}",
        heights.len(),
        args.species,
        heights
            .iter()
            .map(|z| format!("{z:.3}"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "Layer {} (z >= {:.3}), {} atom(s):",
        layer.rank(),
        layer.height(),
        layer.len()
    );
    for (index, (atom_index, atom)) in layer.members().iter().enumerate() {
        let p = atom.position;
        println!(
            "  {}{:<3} #{:<5} ({:>9.4}, {:>9.4}, {:>9.4})",
            args.species, index, atom_index, p.x, p.y, p.z
        );
    }
    Ok(())
}
