use serde::{Deserialize, Serialize};

/// Registry tab a category lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Accepted,
    Pending,
}

impl Section {
    /// Tab caption in the registry summary.
    pub fn tab_label(self) -> &'static str {
        match self {
            Section::Accepted => "REGISTRO",
            Section::Pending => "PENDIENTES",
        }
    }

    /// DataTables id of the detail table rendered for this section.
    pub fn table_id(self) -> &'static str {
        match self {
            Section::Accepted => "tableCompra",
            Section::Pending => "tablePendiente",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Factura Electrónica (33)
    Invoice,
    /// Factura no Afecta o Exenta Electrónica (34)
    ExemptInvoice,
    /// Nota de Crédito Electrónica (61)
    CreditNote,
}

impl DocumentKind {
    pub fn link_text(self) -> &'static str {
        match self {
            DocumentKind::Invoice => "Factura Electrónica",
            DocumentKind::ExemptInvoice => "Factura no Afecta o Exenta Electrónica",
            DocumentKind::CreditNote => "Nota de Crédito Electrónica",
        }
    }

    pub fn doc_type(self) -> DocType {
        match self {
            DocumentKind::CreditNote => DocType::CreditNote,
            DocumentKind::Invoice | DocumentKind::ExemptInvoice => DocType::Invoice,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Invoice,
    CreditNote,
}

impl DocType {
    pub fn as_str(self) -> &'static str {
        match self {
            DocType::Invoice => "invoice",
            DocType::CreditNote => "credit_note",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocStatus {
    Accepted,
    AcceptedExempt,
    Pending,
    PendingExempt,
}

impl DocStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DocStatus::Accepted => "accepted",
            DocStatus::AcceptedExempt => "accepted_exempt",
            DocStatus::Pending => "pending",
            DocStatus::PendingExempt => "pending_exempt",
        }
    }
}

/// One (section, document kind) table scraped per RUT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Category {
    pub section: Section,
    pub kind: DocumentKind,
}

impl Category {
    /// Scrape order within a RUT: accepted tab first, then pending.
    pub const ALL: [Category; 6] = [
        Category::new(Section::Accepted, DocumentKind::Invoice),
        Category::new(Section::Accepted, DocumentKind::ExemptInvoice),
        Category::new(Section::Accepted, DocumentKind::CreditNote),
        Category::new(Section::Pending, DocumentKind::Invoice),
        Category::new(Section::Pending, DocumentKind::ExemptInvoice),
        Category::new(Section::Pending, DocumentKind::CreditNote),
    ];

    pub const fn new(section: Section, kind: DocumentKind) -> Self {
        Self { section, kind }
    }

    pub fn status(self) -> DocStatus {
        match (self.section, self.kind) {
            (Section::Accepted, DocumentKind::ExemptInvoice) => DocStatus::AcceptedExempt,
            (Section::Accepted, _) => DocStatus::Accepted,
            (Section::Pending, DocumentKind::ExemptInvoice) => DocStatus::PendingExempt,
            (Section::Pending, _) => DocStatus::Pending,
        }
    }

    pub fn column_map(self) -> &'static ColumnMap {
        match (self.section, self.kind.doc_type()) {
            (Section::Accepted, _) => &ColumnMap::REGISTRY,
            (Section::Pending, DocType::Invoice) => &ColumnMap::PENDING_INVOICE,
            (Section::Pending, DocType::CreditNote) => &ColumnMap::PENDING_CREDIT_NOTE,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.section.tab_label(), self.kind.link_text())
    }
}

/// Cell positions of one table layout. `None` means the layout has no such column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub name: &'static str,
    /// Cell holding the supplier link (RUT as text, name as tooltip).
    pub supplier: usize,
    pub number: usize,
    pub date: usize,
    pub date_accepted: usize,
    pub payment_type: Option<usize>,
    pub exent_total: usize,
    pub net_total: usize,
    pub iva: usize,
    pub other_tax: Option<usize>,
    pub total: usize,
    /// Exact header width when the layout is fixed; `None` accepts any width of at least
    /// `min_cells()`.
    pub header_count: Option<usize>,
}

impl ColumnMap {
    /// Registro tab: tipo compra, proveedor, folio, fecha docto, fecha recepción, tipo pago,
    /// exento, neto, IVA recuperable, otros impuestos, IVA no recuperable, código, total, ...
    pub const REGISTRY: ColumnMap = ColumnMap {
        name: "registry",
        supplier: 1,
        number: 2,
        date: 3,
        date_accepted: 4,
        payment_type: Some(5),
        exent_total: 6,
        net_total: 7,
        iva: 8,
        other_tax: Some(9),
        total: 12,
        header_count: None,
    };

    /// Pendientes tab, invoices: no tipo compra column.
    pub const PENDING_INVOICE: ColumnMap = ColumnMap {
        name: "pending_invoice",
        supplier: 0,
        number: 1,
        date: 2,
        date_accepted: 3,
        payment_type: Some(4),
        exent_total: 5,
        net_total: 6,
        iva: 7,
        other_tax: Some(8),
        total: 9,
        header_count: Some(10),
    };

    /// Pendientes tab, credit notes: no payment type column either.
    pub const PENDING_CREDIT_NOTE: ColumnMap = ColumnMap {
        name: "pending_credit_note",
        supplier: 0,
        number: 1,
        date: 2,
        date_accepted: 3,
        payment_type: None,
        exent_total: 4,
        net_total: 5,
        iva: 6,
        other_tax: Some(7),
        total: 8,
        header_count: Some(9),
    };

    /// Whether a table with `found` header cells can be read with this layout.
    pub fn accepts_headers(&self, found: usize) -> bool {
        match self.header_count {
            Some(exact) => found == exact,
            None => found >= self.min_cells(),
        }
    }

    /// Minimum cell count a row must have for this layout.
    pub fn min_cells(&self) -> usize {
        [
            Some(self.supplier),
            Some(self.number),
            Some(self.date),
            Some(self.date_accepted),
            self.payment_type,
            Some(self.exent_total),
            Some(self.net_total),
            Some(self.iva),
            self.other_tax,
            Some(self.total),
        ]
        .into_iter()
        .flatten()
        .max()
        .map_or(0, |idx| idx + 1)
    }
}
