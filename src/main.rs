// Entry point and high-level CLI flow.
//
// The console menu stands in for the dashboard front-end:
// - Option [1] loads a CSV export and runs the normalization pipeline,
//   reusing a cached dataset when the file content is unchanged.
// - Option [2] picks year/category/month filters and prints the metric
//   block plus a detail-table preview.
// - Option [3] exports the filtered rows to CSV and the summary to JSON.
use std::fs;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use rkap_report::{
    detail_rows, export_csv, filter_and_summarize, normalize, output, read_table_from_reader,
    util, write_summary_json, ColumnMap, Dataset, DatasetCache, FilterSelection, MonthKey,
};

// In-memory app state so a load survives across menu round-trips and
// re-loading the same file skips normalization.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        cache: DatasetCache::new(),
        columns: ColumnMap::default(),
        dataset: None,
        selection: None,
    })
});

struct AppState {
    cache: DatasetCache,
    columns: ColumnMap,
    dataset: Option<Arc<Dataset>>,
    selection: Option<FilterSelection>,
}

/// Read one line of input after printing a prompt.
fn prompt(label: &str) -> String {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Handle option [1]: read the file, check the content cache, normalize.
fn handle_load() {
    let path = prompt("Enter CSV path: ");
    if path.is_empty() {
        println!("No path given.\n");
        return;
    }

    let bytes = match fs::read(&path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Failed to read file: {}\n", e);
            return;
        }
    };
    let key = DatasetCache::digest(&bytes);

    let mut state = APP_STATE.lock().unwrap();
    if let Some(dataset) = state.cache.get(&key) {
        log::info!("cache hit for digest {}", &key[..12]);
        println!(
            "File unchanged; reusing normalized dataset ({} rows).\n",
            util::format_int(dataset.len() as i64)
        );
        state.dataset = Some(dataset);
        state.selection = None;
        return;
    }

    let table = match read_table_from_reader(&bytes[..]) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to parse CSV: {}\n", e);
            return;
        }
    };

    let required = state.columns.required_columns();
    match normalize(&table, &state.columns, &required) {
        Ok((dataset, report)) => {
            println!(
                "Processing dataset... ({} rows loaded, {} kept)",
                util::format_int(report.total_rows as i64),
                util::format_int(report.kept_rows as i64)
            );
            if report.dropped_missing_keys > 0 {
                println!(
                    "Note: {} rows skipped for missing year/month/category.",
                    util::format_int(report.dropped_missing_keys as i64)
                );
            }
            if report.unmatched_months > 0 {
                println!(
                    "Note: {} rows have unrecognized month labels (listed last).",
                    util::format_int(report.unmatched_months as i64)
                );
            }
            if report.ratio_rescaled {
                println!("Note: Capture Ratio column was fraction-scaled; rescaled to percent.");
            }
            println!();
            let dataset = state.cache.insert(key, dataset);
            state.dataset = Some(dataset);
            state.selection = None;
        }
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

/// Ask for one filter dimension; blank input means "all observed values".
fn prompt_set(label: &str) -> Option<Vec<String>> {
    let raw = prompt(label);
    if raw.is_empty() {
        return None;
    }
    Some(
        raw.split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
    )
}

fn prompt_selection(dataset: &Dataset) -> FilterSelection {
    let all = FilterSelection::all_of(dataset);

    println!(
        "Observed years: {:?}",
        dataset.observed_years().into_iter().collect::<Vec<_>>()
    );
    let years = match prompt_set("Years (comma-separated, blank = all): ") {
        None => all.years.clone(),
        Some(tokens) => tokens.iter().filter_map(|t| t.parse::<i32>().ok()).collect(),
    };

    println!(
        "Observed categories: {}",
        dataset
            .observed_categories()
            .into_iter()
            .collect::<Vec<_>>()
            .join(", ")
    );
    let categories = match prompt_set("Categories (comma-separated, blank = all): ") {
        None => all.categories.clone(),
        Some(tokens) => tokens.into_iter().collect(),
    };

    println!(
        "Observed months: {}",
        dataset
            .observed_months()
            .iter()
            .map(|m| m.label().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    let months = match prompt_set("Months (comma-separated, blank = all): ") {
        None => all.months.clone(),
        Some(tokens) => tokens.iter().map(|t| MonthKey::from_raw(t)).collect(),
    };

    FilterSelection {
        years,
        categories,
        months,
    }
}

/// Handle option [2]: choose filters, print metrics and a table preview.
fn handle_summary() {
    let dataset = {
        let state = APP_STATE.lock().unwrap();
        state.dataset.clone()
    };
    let Some(dataset) = dataset else {
        println!("Error: No data loaded. Please load a CSV file first (option 1).\n");
        return;
    };

    let selection = prompt_selection(&dataset);
    let (rows, summary) = filter_and_summarize(&dataset, &selection);

    println!("\nFiltered rows: {}", util::format_int(summary.row_count as i64));
    println!("Total RKAP:          Rp {}", util::format_number(summary.total_planned, 0));
    println!("Total Achievement:   Rp {}", util::format_number(summary.total_actual, 0));
    match summary.mean_capture_ratio {
        Some(v) => println!("Avg Capture Ratio:   {}%", util::format_number(v, 1)),
        None => println!("Avg Capture Ratio:   N/A"),
    }
    match summary.achievement_vs_plan_percent {
        Some(v) => println!("Achievement vs RKAP: {}%", util::format_number(v, 1)),
        None => println!("Achievement vs RKAP: N/A"),
    }
    println!();
    output::preview_table_rows(&detail_rows(&rows), 10);
    if rows.len() > 10 {
        println!("(showing first 10 of {} rows)\n", util::format_int(rows.len() as i64));
    }

    let mut state = APP_STATE.lock().unwrap();
    state.selection = Some(selection);
}

/// Handle option [3]: export the current filtered rows and summary.
fn handle_export() {
    let (dataset, selection, columns) = {
        let state = APP_STATE.lock().unwrap();
        (
            state.dataset.clone(),
            state.selection.clone(),
            state.columns.clone(),
        )
    };
    let Some(dataset) = dataset else {
        println!("Error: No data loaded. Please load a CSV file first (option 1).\n");
        return;
    };
    let selection = selection.unwrap_or_else(|| FilterSelection::all_of(&dataset));
    let (rows, summary) = filter_and_summarize(&dataset, &selection);

    let path = prompt("Output CSV path (blank = filtered_rows.csv): ");
    let path = if path.is_empty() {
        "filtered_rows.csv".to_string()
    } else {
        path
    };

    let file = match fs::File::create(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Write error: {}\n", e);
            return;
        }
    };
    if let Err(e) = export_csv(file, &columns, &rows) {
        eprintln!("Write error: {}\n", e);
        return;
    }
    if let Err(e) = write_summary_json("summary.json", &summary) {
        eprintln!("Write error: {}\n", e);
        return;
    }
    println!(
        "Exported {} rows to {} (summary in summary.json).\n",
        util::format_int(rows.len() as i64),
        path
    );
}

fn main() {
    pretty_env_logger::init();
    loop {
        println!("RKAP vs Achievement Report");
        println!("[1] Load data file");
        println!("[2] Filter & show summary");
        println!("[3] Export filtered rows");
        println!("[4] Exit\n");
        match prompt("Enter choice: ").as_str() {
            "1" => handle_load(),
            "2" => {
                println!();
                handle_summary();
            }
            "3" => handle_export(),
            "4" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 1-4.\n"),
        }
    }
}
