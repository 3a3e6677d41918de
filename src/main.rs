use log::{error, info};
use opportunity_scraper::config::ScraperConfig;
use opportunity_scraper::logging;
use opportunity_scraper::models::{OpportunityKind, ScrapeFilters};
use opportunity_scraper::persistence::{run_and_persist, MemorySink};

const USAGE: &str = "usage: opportunity_scraper [jobs|scholarships] [pages] \
[--keywords K] [--location L] [--field F] [--country C]";

#[derive(Debug, PartialEq)]
struct Args {
    kind: OpportunityKind,
    pages: u32,
    filters: ScrapeFilters,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args {
        kind: OpportunityKind::Job,
        pages: 1,
        filters: ScrapeFilters::default(),
    };
    let mut positional = 0;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let slot = match arg.as_str() {
            "--keywords" => &mut parsed.filters.keywords,
            "--location" => &mut parsed.filters.location,
            "--field" => &mut parsed.filters.field_of_study,
            "--country" => &mut parsed.filters.country,
            flag if flag.starts_with("--") => return Err(format!("unknown option {}", flag)),
            value => {
                match positional {
                    0 => parsed.kind = value.parse()?,
                    1 => {
                        parsed.pages = value
                            .parse()
                            .map_err(|_| format!("page count must be a number, got {}", value))?
                    }
                    _ => return Err(format!("unexpected argument {}", value)),
                }
                positional += 1;
                continue;
            }
        };
        let value = iter.next().ok_or_else(|| format!("{} needs a value", arg))?;
        *slot = Some(value.clone());
    }

    Ok(parsed)
}

#[tokio::main]
async fn main() {
    logging::init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    let config = ScraperConfig::load();
    info!("Scraping {} ({} pages per source)", args.kind, args.pages);

    let mut sink = MemorySink::new();
    let (batch, _) = run_and_persist(args.kind, &args.filters, args.pages, &config, &mut sink).await;

    match serde_json::to_string_pretty(&batch.summary()) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Could not serialize batch summary: {}", e),
    }
    println!("{} records, {} unique", batch.records.len(), sink.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let parsed = parse_args(&[]).unwrap();
        assert_eq!(parsed.kind, OpportunityKind::Job);
        assert_eq!(parsed.pages, 1);
        assert_eq!(parsed.filters, ScrapeFilters::default());
    }

    #[test]
    fn test_kind_pages_and_filters() {
        let parsed = parse_args(&args(&["scholarships", "3", "--field", "Computer Science", "--country", "Germany"])).unwrap();
        assert_eq!(parsed.kind, OpportunityKind::Scholarship);
        assert_eq!(parsed.pages, 3);
        assert_eq!(parsed.filters.field_of_study.as_deref(), Some("Computer Science"));
        assert_eq!(parsed.filters.country.as_deref(), Some("Germany"));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(parse_args(&args(&["internships"])).is_err());
        assert!(parse_args(&args(&["jobs", "many"])).is_err());
        assert!(parse_args(&args(&["jobs", "--keywords"])).is_err());
        assert!(parse_args(&args(&["jobs", "--salary", "1"])).is_err());
    }
}
