// Entry point and console front-end.
//
// The binary stands in for the browser dashboard:
// - the static JSON sources are loaded once at start-up,
// - a spreadsheet can be imported to replace either record set,
// - filters are set one dimension at a time,
// - the dashboard view recomputes every aggregation from the current
//   records and filters and prints them as markdown tables.
use geo_dashboard::config::DashboardConfig;
use geo_dashboard::filters::{
    apply_filters, distinct_values, sort_by_metric, FilterState, GeoDimension, MediaDimension,
    MediaMetric, SortOrder,
};
use geo_dashboard::loader::{self, LoadReport};
use geo_dashboard::types::{GeoRecord, MediaRecord};
use geo_dashboard::{output, reports, util};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// Session state: the record sets and filter selections live here for the
// whole run. A failed import never touches it.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState::default()));

#[derive(Default)]
struct AppState {
    config: DashboardConfig,
    geo: Vec<GeoRecord>,
    geo_filters: FilterState<GeoDimension>,
    media: Vec<MediaRecord>,
    media_filters: FilterState<MediaDimension>,
}

fn state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Print `label` and read one trimmed line from stdin.
fn prompt(label: &str) -> String {
    print!("{label}");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn print_load_report(what: &str, report: &LoadReport) {
    println!(
        "Imported {} {} records ({} rows read, {} blank).",
        util::format_int(report.imported_rows),
        what,
        util::format_int(report.total_rows),
        util::format_int(report.blank_rows)
    );
    if !report.missing_columns.is_empty() {
        println!("Note: missing columns filled with defaults: {}", report.missing_columns.join(", "));
    }
    println!();
}

/// Load both static JSON sources. A missing or broken source just leaves
/// that record set empty.
fn load_static_sources() {
    let mut st = state();
    match loader::load_json_records::<GeoRecord>(&st.config.geo_data_path) {
        Ok(records) => st.geo = records,
        Err(e) => warn!(path = %st.config.geo_data_path, error = %e, "failed to load GEO data"),
    }
    match loader::load_json_records::<MediaRecord>(&st.config.media_data_path) {
        Ok(records) => st.media = records,
        Err(e) => warn!(path = %st.config.media_data_path, error = %e, "failed to load media data"),
    }
    println!(
        "Loaded {} GEO records and {} media records.\n",
        util::format_int(st.geo.len()),
        util::format_int(st.media.len())
    );
}

/// Handle option [1]: import a spreadsheet into the GEO or media set.
fn handle_import() {
    let kind = prompt("Import as (geo/media): ");
    let path = prompt("Spreadsheet path: ");
    let epoch = state().config.date_epoch;
    let result = match kind.as_str() {
        "geo" => loader::import_geo_file(&path, epoch).map(|(records, report)| {
            print_load_report("GEO", &report);
            state().geo = records;
        }),
        "media" => loader::import_media_file(&path, epoch).map(|(records, report)| {
            print_load_report("media", &report);
            state().media = records;
        }),
        _ => {
            println!("Invalid choice. Please enter geo or media.\n");
            return;
        }
    };
    if let Err(e) = result {
        error!(path = %path, error = %e, "import failed");
        println!("Import failed, previous data kept: {e}\n");
    }
}

/// Handle option [2]: set or clear one filter selection.
fn handle_filter() {
    let kind = prompt("Filter which dataset (geo/media): ");
    let mut st = state();
    match kind.as_str() {
        "geo" => {
            let dim = match prompt("Dimension (date/platform/keyword/keywordType/exposeType/outcome): ")
                .parse::<GeoDimension>()
            {
                Ok(d) => d,
                Err(e) => return println!("{e}\n"),
            };
            let options = distinct_values(&st.geo, dim);
            println!("Options: {}", options.join(" | "));
            let value = prompt("Value (empty clears): ");
            st.geo_filters.select(dim, value);
        }
        "media" => {
            let dim = match prompt("Dimension (project/media/platform/account/date): ")
                .parse::<MediaDimension>()
            {
                Ok(d) => d,
                Err(e) => return println!("{e}\n"),
            };
            let options = distinct_values(&st.media, dim);
            println!("Options: {}", options.join(" | "));
            let value = prompt("Value (empty clears): ");
            st.media_filters.select(dim, value);
        }
        _ => println!("Invalid choice. Please enter geo or media."),
    }
    println!();
}

/// Handle option [3]: recompute and print both dashboards.
fn handle_show() {
    let st = state();

    let geo = apply_filters(&st.geo, &st.geo_filters);
    let summary = reports::geo_summary(&geo, &st.config);
    println!("== GEO monitoring ({} of {} records) ==\n", geo.len(), st.geo.len());
    output::preview_table("KPIs", &[summary.kpis], 1);
    output::preview_table("Exposure by platform", &summary.platform_rates, 20);
    output::preview_table("Exposure by keyword type", &summary.keyword_type_rates, 20);
    output::preview_table("Exposure trend", &summary.trend, 60);
    output::preview_table("Exposure types", &summary.expose_types, 20);
    output::preview_table("Records", &geo, 20);

    let media = apply_filters(&st.media, &st.media_filters);
    let summary = reports::media_summary(&media, &st.config);
    println!("== Media performance ({} of {} records) ==\n", media.len(), st.media.len());
    println!(
        "Reads: {}  Interactions: {}\n",
        util::format_int(summary.totals.total_reads),
        util::format_int(summary.totals.total_interactions)
    );
    output::preview_table("Platform share", &summary.platform_share, st.config.top_n + 1);
    let sorted = sort_by_metric(&media, MediaMetric::Reads, SortOrder::Descending);
    output::preview_table("Placements by reads", &sorted, 20);
}

/// Handle option [4]: export the filtered GEO records and the summary.
fn handle_export() {
    let st = state();
    let geo = apply_filters(&st.geo, &st.geo_filters);
    let summary = reports::geo_summary(&geo, &st.config);
    let csv_path = "geo_records.csv";
    let json_path = "geo_summary.json";
    match output::write_csv(csv_path, &geo).and_then(|()| output::write_json(json_path, &summary)) {
        Ok(()) => println!("Exported {} records to {csv_path} and the summary to {json_path}.\n", geo.len()),
        Err(e) => {
            error!(error = %e, "export failed");
            println!("Export failed: {e}\n");
        }
    }
}

/// Handle option [5]: drop every filter selection on both datasets.
fn handle_clear_filters() {
    let mut st = state();
    st.geo_filters.clear_all();
    st.media_filters.clear_all();
    info!("filters cleared");
    println!("All filters cleared.\n");
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let config_path = std::env::var("DASHBOARD_CONFIG").unwrap_or_else(|_| "dashboard.json".to_string());
    match DashboardConfig::load_or_default(&config_path) {
        Ok(config) => state().config = config,
        Err(e) => {
            error!(path = %config_path, error = %e, "invalid config");
            std::process::exit(1);
        }
    }
    load_static_sources();

    loop {
        println!("Select an action:");
        println!("[1] Import spreadsheet");
        println!("[2] Set filter");
        println!("[3] Show dashboard");
        println!("[4] Export filtered GEO records");
        println!("[5] Clear filters");
        println!("[0] Exit\n");
        match prompt("Enter choice: ").as_str() {
            "1" => handle_import(),
            "2" => handle_filter(),
            "3" => handle_show(),
            "4" => handle_export(),
            "5" => handle_clear_filters(),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0-5.\n"),
        }
    }
}
