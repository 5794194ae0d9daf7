use foodscale::{EstimateParams, Estimator, FoodImage};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!(
            "Usage: {} <image.jpg> <food_type> [plate_diameter_cm] [out.json]",
            args[0]
        );
        std::process::exit(2);
    }

    let image = FoodImage::decode(&std::fs::read(&args[1])?)?;
    let plate_diameter_cm: f64 = match args.get(3) {
        Some(s) => s.parse()?,
        None => foodscale::DEFAULT_PLATE_DIAMETER_CM,
    };
    let params = EstimateParams::new(Some(args[2].clone()), plate_diameter_cm)?;

    let estimator = Estimator::new();
    let result = estimator.estimate(&image, &params)?;

    println!(
        "{} region(s), {:.1} ml total, {:.1} g as '{}' ({:?}).",
        result.volumes_ml.len(),
        result.total_volume_ml(),
        result.weight_grams,
        result.food_type_match,
        result.status
    );
    if !result.fallbacks.is_empty() {
        println!("Fallbacks: {:?}", result.fallbacks);
    }

    if let Some(out_path) = args.get(4) {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(out_path, json)?;
        println!("Wrote {out_path}");
    }
    Ok(())
}
