use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Cursor;
use std::path::PathBuf;
use subject_survey::error::AppError;
use subject_survey::survey::{
    score_responses, synthetic_responses, Catalog, CatalogImporter, ScoreReport, SurveyVariant,
};

const LITE_SAMPLE_CSV: &str = include_str!("../../../data/lite.csv");
const FULL_SAMPLE_CSV: &str = include_str!("../../../data/full.csv");

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Survey variant to demo (lite or full)
    #[arg(long, default_value = "lite", value_parser = crate::infra::parse_variant)]
    pub(crate) variant: Option<SurveyVariant>,
    /// Seed for the synthetic respondent. Defaults to OS entropy.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Number of ranked subjects to print
    #[arg(long, default_value_t = 8)]
    pub(crate) top: usize,
    /// Optional catalog CSV to score instead of the bundled sample
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        variant,
        seed,
        top,
        catalog,
    } = args;

    let variant = variant.unwrap_or(SurveyVariant::Lite);
    let catalog = load_demo_catalog(catalog, variant)?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let responses = synthetic_responses(&catalog, &mut rng);
    let result = score_responses(&catalog, &responses);
    let report = ScoreReport::build(&catalog, &result, Some(top));

    println!("Subject survey demo ({} variant)", variant.label());
    println!(
        "Synthetic respondent answered {} of {} questions",
        responses.len(),
        catalog.len()
    );

    println!("\nRanked subjects");
    for entry in &report.ranking {
        println!(
            "{:>3}. {:<16} {:>5.2}  [{}]",
            entry.rank, entry.subject, entry.score, entry.section_label
        );
    }

    println!("\nBy section");
    for group in &report.sections {
        println!("- {}", group.section_label);
        for entry in &group.subjects {
            println!("    #{:<3} {:<16} {:>5.2}", entry.rank, entry.subject, entry.score);
        }
    }

    if report.low_variance {
        println!("\nNote: every answer was identical; the ranking carries little signal.");
    }

    Ok(())
}

fn load_demo_catalog(path: Option<PathBuf>, variant: SurveyVariant) -> Result<Catalog, AppError> {
    match path {
        Some(path) => CatalogImporter::from_path(&path).map_err(AppError::from),
        None => {
            let csv = match variant {
                SurveyVariant::Lite => LITE_SAMPLE_CSV,
                SurveyVariant::Full => FULL_SAMPLE_CSV,
            };
            CatalogImporter::from_reader(Cursor::new(csv)).map_err(AppError::from)
        }
    }
}
