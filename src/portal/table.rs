use crate::error::LayoutError;
use crate::models::{ColumnMap, RawInvoiceRow};
use scraper::{ElementRef, Html, Selector};

/// Tags stamped on every row read from one category table.
#[derive(Debug, Clone)]
pub struct RowContext {
    pub rut_holding: String,
    pub status: &'static str,
    pub doc_type: &'static str,
}

fn selector(css: &str) -> Result<Selector, LayoutError> {
    Selector::parse(css).map_err(|_| LayoutError::Selector(css.to_string()))
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn optional(cells: &[ElementRef], idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| cells.get(i))
        .map(cell_text)
        .filter(|s| !s.is_empty())
}

/// Read every data row of `#table_id` with the given column layout.
///
/// DataTables placeholder rows (`td.dataTables_empty`) are ignored.
pub fn read_rows(
    html: &str,
    table_id: &str,
    layout: &ColumnMap,
    ctx: &RowContext,
) -> Result<Vec<RawInvoiceRow>, LayoutError> {
    let document = Html::parse_document(html);
    let table_sel = selector(&format!("#{}", table_id))?;
    let header_sel = selector("thead th")?;
    let row_sel = selector("tbody tr")?;
    let cell_sel = selector("td")?;
    let link_sel = selector("a")?;

    let Some(table) = document.select(&table_sel).next() else {
        return Err(LayoutError::MissingTable {
            table: table_id.to_string(),
        });
    };

    let expected = layout.min_cells();
    let headers = table.select(&header_sel).count();
    if headers > 0 && !layout.accepts_headers(headers) {
        return Err(LayoutError::HeaderMismatch {
            table: table_id.to_string(),
            layout: layout.name,
            expected: layout.header_count.unwrap_or(expected),
            found: headers,
        });
    }

    let mut rows = Vec::new();
    for (idx, tr) in table.select(&row_sel).enumerate() {
        let cells: Vec<ElementRef> = tr.select(&cell_sel).collect();
        if cells.len() == 1 && cells[0].value().classes().any(|c| c == "dataTables_empty") {
            continue;
        }
        if cells.len() < expected {
            return Err(LayoutError::ShortRow {
                table: table_id.to_string(),
                layout: layout.name,
                row: idx,
                expected,
                found: cells.len(),
            });
        }

        let supplier_cell = &cells[layout.supplier];
        let (supplier_id, supplier_name) = match supplier_cell.select(&link_sel).next() {
            Some(link) => {
                let name = link
                    .value()
                    .attr("data-original-title")
                    .or_else(|| link.value().attr("title"))
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                (cell_text(&link), name)
            }
            None => (cell_text(supplier_cell), String::new()),
        };

        rows.push(RawInvoiceRow {
            supplier_id,
            supplier_name,
            number: cell_text(&cells[layout.number]),
            date: cell_text(&cells[layout.date]),
            date_accepted: optional(&cells, Some(layout.date_accepted)),
            payment_type: optional(&cells, layout.payment_type),
            exent_total: optional(&cells, Some(layout.exent_total)),
            net_total: optional(&cells, Some(layout.net_total)),
            iva: optional(&cells, Some(layout.iva)),
            other_tax: optional(&cells, layout.other_tax),
            total: optional(&cells, Some(layout.total)),
            rut_holding: ctx.rut_holding.clone(),
            status: ctx.status.to_string(),
            doc_type: ctx.doc_type.to_string(),
        });
    }

    Ok(rows)
}
