use crate::cli::DistancesArgs;
use crate::error::Result;
use sitegen::core::utils::geometry::pair_distances;
use sitegen::workflows::generate::read_structure;

pub fn run(args: DistancesArgs) -> Result<()> {
    let structure = read_structure(&args.input)?;
    let pairs = pair_distances(&structure, &args.first, &args.second);
    if pairs.is_empty() {
        println!("No {}-{} pairs found.", args.first, args.second);
        return Ok(());
    }

    let shown = args.limit.unwrap_or(pairs.len()).min(pairs.len());
    println!(
        "{} {}-{} pair(s), shortest {}:",
        pairs.len(),
        args.first,
        args.second,
        shown
    );
    for pair in &pairs[..shown] {
        println!(
            "  {:>10.4}  {}#{} - {}#{}",
            pair.distance, pair.first_symbol, pair.first_index, pair.second_symbol, pair.second_index
        );
    }
    Ok(())
}
