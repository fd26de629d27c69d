use crate::domain::model::Lead;
use crate::utils::error::Result;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const EXPORT_HEADER: [&str; 9] = [
    "Categoria",
    "Cidade",
    "Bairro",
    "Nome",
    "Telefone",
    "Endereço",
    "Site",
    "Nota",
    "Avaliações",
];

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const SHEET_NAME: &str = "Leads";
const COLUMNS: [&str; 9] = ["A", "B", "C", "D", "E", "F", "G", "H", "I"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "xlsx" | "excel" => Some(ExportFormat::Xlsx),
            _ => None,
        }
    }

    pub fn filename(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "leads.csv",
            ExportFormat::Xlsx => "leads.xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => CSV_CONTENT_TYPE,
            ExportFormat::Xlsx => XLSX_CONTENT_TYPE,
        }
    }

    pub fn render(&self, leads: &[Lead]) -> Result<Vec<u8>> {
        match self {
            ExportFormat::Csv => leads_to_csv(leads),
            ExportFormat::Xlsx => leads_to_xlsx(leads),
        }
    }
}

/// Valores de um lead na ordem das colunas exportadas.
pub fn lead_row(lead: &Lead) -> [String; 9] {
    [
        lead.category.clone(),
        lead.city.clone(),
        lead.neighborhood.clone(),
        lead.name.clone(),
        lead.phone.clone(),
        lead.address.clone(),
        lead.website.clone(),
        lead.rating_display(),
        lead.review_count.to_string(),
    ]
}

/// CSV separado por ";" com BOM, para abrir direto no Excel.
pub fn leads_to_csv(leads: &[Lead]) -> Result<Vec<u8>> {
    let mut buffer = UTF8_BOM.to_vec();
    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .from_writer(&mut buffer);
        writer.write_record(EXPORT_HEADER)?;
        for lead in leads {
            writer.write_record(lead_row(lead))?;
        }
        writer.flush()?;
    }
    Ok(buffer)
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            // caracteres de controle não são válidos em XML 1.0
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => escaped.push(c),
        }
    }
    escaped
}

fn string_cell(reference: &str, value: &str, style: Option<u8>) -> String {
    let style_attr = style.map(|s| format!(" s=\"{}\"", s)).unwrap_or_default();
    format!(
        "<c r=\"{}\" t=\"inlineStr\"{}><is><t xml:space=\"preserve\">{}</t></is></c>",
        reference,
        style_attr,
        escape_xml(value)
    )
}

fn number_cell(reference: &str, value: u32) -> String {
    format!("<c r=\"{}\"><v>{}</v></c>", reference, value)
}

fn sheet_xml(leads: &[Lead]) -> String {
    let mut rows = String::new();

    rows.push_str("<row r=\"1\">");
    for (col, title) in COLUMNS.iter().zip(EXPORT_HEADER.iter()) {
        rows.push_str(&string_cell(&format!("{}1", col), title, Some(1)));
    }
    rows.push_str("</row>");

    for (index, lead) in leads.iter().enumerate() {
        let row_number = index + 2;
        rows.push_str(&format!("<row r=\"{}\">", row_number));
        let values = lead_row(lead);
        for (col_index, (col, value)) in COLUMNS.iter().zip(values.iter()).enumerate() {
            let reference = format!("{}{}", col, row_number);
            if col_index == 8 {
                rows.push_str(&number_cell(&reference, lead.review_count));
            } else {
                rows.push_str(&string_cell(&reference, value, None));
            }
        }
        rows.push_str("</row>");
    }

    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
            "<worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">",
            "<sheetData>{}</sheetData></worksheet>"
        ),
        rows
    )
}

const CONTENT_TYPES_XML: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
    "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">",
    "<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>",
    "<Default Extension=\"xml\" ContentType=\"application/xml\"/>",
    "<Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>",
    "<Override PartName=\"/xl/worksheets/sheet1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>",
    "<Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>",
    "</Types>"
);

const ROOT_RELS_XML: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
    "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"xl/workbook.xml\"/>",
    "</Relationships>"
);

const WORKBOOK_RELS_XML: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
    "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet1.xml\"/>",
    "<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>",
    "</Relationships>"
);

// Estilo 1 = cabeçalho em negrito
const STYLES_XML: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
    "<styleSheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">",
    "<fonts count=\"2\"><font><sz val=\"11\"/><name val=\"Calibri\"/></font>",
    "<font><b/><sz val=\"11\"/><name val=\"Calibri\"/></font></fonts>",
    "<fills count=\"1\"><fill><patternFill patternType=\"none\"/></fill></fills>",
    "<borders count=\"1\"><border><left/><right/><top/><bottom/><diagonal/></border></borders>",
    "<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>",
    "<cellXfs count=\"2\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"/>",
    "<xf numFmtId=\"0\" fontId=\"1\" fillId=\"0\" borderId=\"0\" xfId=\"0\" applyFont=\"1\"/></cellXfs>",
    "</styleSheet>"
);

fn workbook_xml() -> String {
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
            "<workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" ",
            "xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">",
            "<sheets><sheet name=\"{}\" sheetId=\"1\" r:id=\"rId1\"/></sheets></workbook>"
        ),
        SHEET_NAME
    )
}

/// Planilha .xlsx mínima (uma aba "Leads", cabeçalho em negrito).
pub fn leads_to_xlsx(leads: &[Lead]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let parts: [(&str, String); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
        ("_rels/.rels", ROOT_RELS_XML.to_string()),
        ("xl/workbook.xml", workbook_xml()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML.to_string()),
        ("xl/styles.xml", STYLES_XML.to_string()),
        ("xl/worksheets/sheet1.xml", sheet_xml(leads)),
    ];

    for (name, content) in parts.iter() {
        zip.start_file::<_, ()>(*name, FileOptions::default())?;
        zip.write_all(content.as_bytes())?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
