use chrono::{DateTime, Utc};
use std::io::Cursor;

use crate::models::export_request::ExportFormat;
use crate::models::order::Order;

pub const EXPORT_FILENAME_PREFIX: &str = "registry_export";

const SHEET_NAME: &str = "Orders";

const HEADERS: [&str; 7] = [
    "Order Number",
    "Customer Name",
    "Customer Email",
    "Total Amount",
    "Status",
    "Payment Method",
    "Order Date",
];

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Buffer error: {0}")]
    Buffer(String),
}

/// `registry_export_<YYYYMMDD_HHMMSS>.<ext>`
pub fn export_filename(format: ExportFormat, at: DateTime<Utc>) -> String {
    format!(
        "{}_{}.{}",
        EXPORT_FILENAME_PREFIX,
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

fn order_date(order: &Order) -> String {
    order.created_at.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn text_fields(order: &Order) -> [String; 7] {
    [
        order.order_number.clone(),
        order.customer_name.clone(),
        order.customer_email.clone(),
        format!("{:.2}", order.total_amount),
        order.status.clone(),
        order.payment_method.clone(),
        order_date(order),
    ]
}

/// Renders orders into the bytes of a file of the given format.
#[tracing::instrument(skip(orders), fields(rows = orders.len()))]
pub fn render(orders: &[Order], format: ExportFormat) -> Result<Vec<u8>, RenderError> {
    match format {
        ExportFormat::Xlsx => render_xlsx(orders),
        ExportFormat::Csv => render_csv(orders),
        ExportFormat::Json => Ok(serde_json::to_vec_pretty(orders)?),
    }
}

fn render_csv(orders: &[Order]) -> Result<Vec<u8>, RenderError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(HEADERS)?;
    for order in orders {
        wtr.write_record(text_fields(order))?;
    }

    wtr.into_inner()
        .map_err(|e| RenderError::Buffer(e.to_string()))
}

fn render_xlsx(orders: &[Order]) -> Result<Vec<u8>, RenderError> {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_by_name_mut("Sheet1")
        .ok_or_else(|| RenderError::Spreadsheet("Default worksheet missing".to_string()))?;
    sheet.set_name(SHEET_NAME);

    // umya coordinates are (column, row), both 1-based
    for (col, header) in HEADERS.iter().enumerate() {
        sheet.get_cell_mut((col as u32 + 1, 1u32)).set_value(*header);
    }

    for (idx, order) in orders.iter().enumerate() {
        let row = idx as u32 + 2;
        sheet.get_cell_mut((1u32, row)).set_value(order.order_number.as_str());
        sheet.get_cell_mut((2u32, row)).set_value(order.customer_name.as_str());
        sheet.get_cell_mut((3u32, row)).set_value(order.customer_email.as_str());
        sheet
            .get_cell_mut((4u32, row))
            .set_value_number(order.total_amount);
        sheet.get_cell_mut((5u32, row)).set_value(order.status.as_str());
        sheet.get_cell_mut((6u32, row)).set_value(order.payment_method.as_str());
        sheet.get_cell_mut((7u32, row)).set_value(order_date(order));
    }

    let mut out = Cursor::new(Vec::<u8>::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut out)
        .map_err(|e| RenderError::Spreadsheet(e.to_string()))?;

    Ok(out.into_inner())
}
