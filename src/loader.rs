use crate::error::{DashboardError, Result};
use crate::types::{GeoRecord, MediaRecord, YES_TOKEN};
use crate::util::{
    coerce_count, coerce_date, coerce_flag, coerce_outcome, coerce_position, coerce_text, Cell,
    DateEpoch,
};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

/// Header titles of the GEO monitoring sheet.
pub mod geo_columns {
    pub const DATE: &str = "检测日期";
    pub const PLATFORM: &str = "AI平台";
    pub const KEYWORD: &str = "查询关键词";
    pub const KEYWORD_TYPE: &str = "关键词类型";
    pub const EXPOSED: &str = "是否露出";
    pub const POSITION: &str = "露出位置";
    pub const EXPOSE_TYPE: &str = "露出类型";
    pub const WIN: &str = "我方胜出";
    pub const CONTENT: &str = "露出原文";
    pub const SCREENSHOT: &str = "证据截图";

    pub const ALL: [&str; 10] = [
        DATE, PLATFORM, KEYWORD, KEYWORD_TYPE, EXPOSED, POSITION, EXPOSE_TYPE, WIN, CONTENT,
        SCREENSHOT,
    ];
}

/// Header titles of the media placement sheet.
pub mod media_columns {
    pub const ID: &str = "序号";
    pub const PROJECT: &str = "客户名称";
    pub const MEDIA: &str = "媒体名称";
    pub const PLATFORM: &str = "发布平台";
    pub const POSITION: &str = "发布位置";
    pub const TITLE: &str = "见刊标题";
    pub const LINK: &str = "见刊链接";
    pub const READS: &str = "阅读量/播放量";
    pub const INTERACTIONS: &str = "互动量";
    pub const DATE: &str = "见刊日期";

    pub const ALL: [&str; 10] = [
        ID, PROJECT, MEDIA, PLATFORM, POSITION, TITLE, LINK, READS, INTERACTIONS, DATE,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadReport {
    /// Data rows below the header, blank ones included.
    pub total_rows: usize,
    pub imported_rows: usize,
    pub blank_rows: usize,
    /// Expected header titles that the sheet does not have.
    pub missing_columns: Vec<&'static str>,
}

static EMPTY_CELL: Cell = Cell::Empty;

/// The first worksheet of a workbook: a header lookup plus data rows.
#[derive(Debug, Clone, Default)]
pub struct SheetTable {
    columns: HashMap<String, usize>,
    rows: Vec<Vec<Cell>>,
}

impl SheetTable {
    /// Header titles are trimmed; on duplicates the leftmost column wins.
    pub fn new(header: &[Cell], rows: Vec<Vec<Cell>>) -> Self {
        let mut columns = HashMap::new();
        for (idx, cell) in header.iter().enumerate() {
            let title = coerce_text(cell);
            if !title.is_empty() {
                columns.entry(title).or_insert(idx);
            }
        }
        Self { columns, rows }
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// The cell under `column` in `row`, or an empty cell when the column is
    /// absent or the row is short.
    pub fn cell<'a>(&self, row: &'a [Cell], column: &str) -> &'a Cell {
        self.columns
            .get(column)
            .and_then(|idx| row.get(*idx))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn missing_columns(&self, expected: &[&'static str]) -> Vec<&'static str> {
        expected
            .iter()
            .copied()
            .filter(|c| !self.columns.contains_key(*c))
            .collect()
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) => Cell::Text(s.clone()),
            Data::Bool(b) => Cell::Bool(*b),
            // as_datetime applies the workbook's 1900/1904 flag
            Data::DateTime(dt) => dt
                .as_datetime()
                .map(|d| Cell::Date(d.date()))
                .unwrap_or_else(|| Cell::Number(dt.as_f64())),
            Data::DateTimeIso(s) => Cell::Text(s.clone()),
            _ => Cell::Empty,
        }
    }
}

/// Decode the first worksheet of an xlsx / xls / xlsb / ods payload.
pub fn read_first_sheet(bytes: &[u8]) -> Result<SheetTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DashboardError::Parse("workbook has no worksheets".to_string()))??;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(Cell::from).collect::<Vec<Cell>>());
    let Some(header) = rows.next() else {
        debug!("first worksheet is empty");
        return Ok(SheetTable::default());
    };
    Ok(SheetTable::new(&header, rows.collect()))
}

fn scan_rows<T>(
    table: &SheetTable,
    expected: &[&'static str],
    mut map_row: impl FnMut(usize, &[Cell]) -> T,
) -> (Vec<T>, LoadReport) {
    let missing_columns = table.missing_columns(expected);
    if !missing_columns.is_empty() {
        warn!(missing = ?missing_columns, "sheet is missing expected columns; using defaults");
    }
    let mut out = Vec::new();
    let mut blank_rows = 0usize;
    for row in table.rows() {
        if row.iter().all(Cell::is_blank) {
            blank_rows += 1;
            continue;
        }
        out.push(map_row(out.len(), row));
    }
    let report = LoadReport {
        total_rows: table.rows().len(),
        imported_rows: out.len(),
        blank_rows,
        missing_columns,
    };
    (out, report)
}

/// Map sheet rows onto GEO records. Never fails; bad cells take defaults.
pub fn map_geo_rows(table: &SheetTable, epoch: DateEpoch) -> (Vec<GeoRecord>, LoadReport) {
    use geo_columns as col;
    scan_rows(table, &col::ALL, |key, row| {
        let cell = |name: &str| table.cell(row, name);
        GeoRecord {
            key,
            date: coerce_date(cell(col::DATE), epoch),
            platform: coerce_text(cell(col::PLATFORM)),
            keyword: coerce_text(cell(col::KEYWORD)),
            keyword_type: coerce_text(cell(col::KEYWORD_TYPE)),
            is_exposed: coerce_flag(cell(col::EXPOSED), YES_TOKEN),
            position: coerce_position(cell(col::POSITION)),
            expose_type: coerce_text(cell(col::EXPOSE_TYPE)),
            outcome: coerce_outcome(cell(col::WIN)),
            content: coerce_text(cell(col::CONTENT)),
            screenshot: coerce_text(cell(col::SCREENSHOT)),
        }
    })
}

/// Map sheet rows onto media records. A missing sequence number falls back
/// to the 1-based row number and a missing account to the media name.
pub fn map_media_rows(table: &SheetTable, epoch: DateEpoch) -> (Vec<MediaRecord>, LoadReport) {
    use media_columns as col;
    scan_rows(table, &col::ALL, |idx, row| {
        let cell = |name: &str| table.cell(row, name);
        let mut id = coerce_text(cell(col::ID));
        if id.is_empty() {
            id = (idx + 1).to_string();
        }
        let media = coerce_text(cell(col::MEDIA));
        MediaRecord {
            id,
            project: coerce_text(cell(col::PROJECT)),
            account: media.clone(),
            media,
            platform: coerce_text(cell(col::PLATFORM)),
            position: coerce_text(cell(col::POSITION)),
            title: coerce_text(cell(col::TITLE)),
            link: coerce_text(cell(col::LINK)),
            reads: coerce_count(cell(col::READS)),
            interactions: coerce_count(cell(col::INTERACTIONS)),
            date: coerce_date(cell(col::DATE), epoch),
        }
    })
}

pub fn import_geo_sheet(bytes: &[u8], epoch: DateEpoch) -> Result<(Vec<GeoRecord>, LoadReport)> {
    let table = read_first_sheet(bytes)?;
    let (records, report) = map_geo_rows(&table, epoch);
    info!(
        rows = report.total_rows,
        imported = report.imported_rows,
        blank = report.blank_rows,
        "imported GEO sheet"
    );
    Ok((records, report))
}

pub fn import_media_sheet(bytes: &[u8], epoch: DateEpoch) -> Result<(Vec<MediaRecord>, LoadReport)> {
    let table = read_first_sheet(bytes)?;
    let (records, report) = map_media_rows(&table, epoch);
    info!(
        rows = report.total_rows,
        imported = report.imported_rows,
        blank = report.blank_rows,
        "imported media sheet"
    );
    Ok((records, report))
}

pub fn import_geo_file(path: impl AsRef<Path>, epoch: DateEpoch) -> Result<(Vec<GeoRecord>, LoadReport)> {
    let bytes = std::fs::read(path)?;
    import_geo_sheet(&bytes, epoch)
}

pub fn import_media_file(path: impl AsRef<Path>, epoch: DateEpoch) -> Result<(Vec<MediaRecord>, LoadReport)> {
    let bytes = std::fs::read(path)?;
    import_media_sheet(&bytes, epoch)
}

/// Decode a JSON array of records (the static data source).
pub fn parse_json_records<T: DeserializeOwned>(text: &str) -> Result<Vec<T>> {
    Ok(serde_json::from_str(text)?)
}

pub fn load_json_records<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let records: Vec<T> = parse_json_records(&text)?;
    info!(path = %path.display(), records = records.len(), "loaded JSON source");
    Ok(records)
}
