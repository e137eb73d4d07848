//! Layout Engine: turns a template tree into page-scoped
//! drawing instructions. Follows `victor`'s `layout/mod.rs` for module
//! shape (a tree walk producing a flat fragment/instruction list); the
//! cursor/pagination/table model itself is new, `victor` having no
//! tabular pagination of its own.

mod images;
mod wrap;

pub use images::ImageResource;
pub use wrap::{measure_pt, wrap};

use crate::diagnostics::{Diagnostics, Warning};
use crate::fonts::usage::{FontKey, FontUsage};
use crate::fonts::{FontRegistry, ResolvedFont, Standard14};
use crate::primitives::RGBA;
use crate::template::{
    Align, CellProps, Element, Footer, FormFieldType, ImageData, Margins, PageBorders, Row,
    StyledText, Table, Template, Title,
};

const ROW_HEIGHT: f32 = 25.0;
const TITLE_ROW_HEIGHT: f32 = 50.0;
const CELL_PADDING: f32 = 2.0;
const LINE_HEIGHT_FACTOR: f32 = 1.2;
const WATERMARK_SIZE: f32 = 48.0;
const PAGE_COUNT_PLACEHOLDER: &str = "\u{0}PAGECOUNT\u{0}";

#[derive(Clone)]
pub enum Instruction {
    Text { x: f32, y: f32, font: ResolvedFont, size: f32, color: RGBA, text: String },
    RotatedText { x: f32, y: f32, font: ResolvedFont, size: f32, color: RGBA, angle_degrees: f32, text: String },
    Line { x0: f32, y0: f32, x1: f32, y1: f32, width: f32 },
    FillRect { x: f32, y: f32, w: f32, h: f32, color: RGBA },
    Image { x: f32, y: f32, w: f32, h: f32, image_index: usize },
}

pub enum LinkTarget {
    Uri(String),
    Dest(String),
}

pub struct LinkAnnotation {
    pub rect: (f32, f32, f32, f32),
    pub target: LinkTarget,
}

pub struct DestAnchor {
    pub name: String,
    pub page_index: usize,
    pub x: f32,
    pub y: f32,
}

pub struct FormFieldSpec {
    pub kind: FormFieldType,
    pub name: String,
    pub value: String,
    pub checked: bool,
    pub max_len: Option<u32>,
}

pub struct FormWidgetPlacement {
    pub rect: (f32, f32, f32, f32),
    pub field: FormFieldSpec,
}

pub struct Page {
    pub media_box: (f32, f32, f32, f32),
    pub instructions: Vec<Instruction>,
    pub link_annotations: Vec<LinkAnnotation>,
    pub form_widgets: Vec<FormWidgetPlacement>,
    pub dest_anchors: Vec<DestAnchor>,
}

pub struct LayoutOutput {
    pub pages: Vec<Page>,
    pub images: Vec<ImageResource>,
    pub usage: FontUsage,
}

struct RowLayout {
    height: f32,
    cell_lines: Vec<Vec<String>>,
}

const STANDARD_ALIASES: &[&str] = &[
    "helvetica", "arial", "times", "times-roman", "times new roman", "serif", "courier",
    "courier new", "monospace", "symbol", "zapfdingbats",
];

fn parse_color(raw: &str) -> RGBA {
    let hex = raw.trim_start_matches('#');
    if hex.len() == 6 {
        if let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&hex[0..2], 16),
            u8::from_str_radix(&hex[2..4], 16),
            u8::from_str_radix(&hex[4..6], 16),
        ) {
            return RGBA(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0);
        }
    }
    RGBA::BLACK
}

/// Normalize column weights and resolve per-row cell widths, per
/// `spec.md` §4.3 "Column resolution". When a row's assigned widths leave the
/// usable width under-subscribed, the remainder goes to the last cell without
/// an explicit `width` override (or the last cell, if every cell has one) —
/// the policy this crate picked for Open Question 9(a).
fn resolve_column_widths(table: &Table, usable_width: f32) -> Vec<Vec<f32>> {
    let n = table.maxcolumns as usize;
    let raw_weights = if table.columnwidths.is_empty() { vec![1.0; n] } else { table.columnwidths.clone() };
    let weight_sum: f32 = raw_weights.iter().sum::<f32>().max(f32::MIN_POSITIVE);
    let normalized: Vec<f32> = raw_weights.iter().map(|w| w / weight_sum).collect();

    table
        .rows
        .iter()
        .map(|row| {
            let mut widths: Vec<f32> = (0..n)
                .map(|i| {
                    row.cells
                        .get(i)
                        .and_then(|cell| cell.width)
                        .unwrap_or_else(|| usable_width * normalized.get(i).copied().unwrap_or(0.0))
                })
                .collect();

            let total: f32 = widths.iter().sum();
            if total > usable_width + 1.0 {
                let scale = usable_width / total;
                for w in &mut widths {
                    *w *= scale;
                }
            } else if total < usable_width - 1.0 {
                let excess = usable_width - total;
                let target = row
                    .cells
                    .iter()
                    .rposition(|cell| cell.width.is_none())
                    .unwrap_or_else(|| widths.len().saturating_sub(1));
                if let Some(w) = widths.get_mut(target) {
                    *w += excess;
                }
            }
            widths
        })
        .collect()
}

struct Builder<'a> {
    fonts: &'a FontRegistry,
    diagnostics: &'a mut Diagnostics,
    usage: FontUsage,
    images: Vec<ImageResource>,
    pages: Vec<Page>,
    page_width: f32,
    page_height: f32,
    margins: Margins,
    borders: PageBorders,
    watermark: Option<String>,
    footer: Option<Footer>,
    cur: Page,
    cursor_y: f32,
}

impl<'a> Builder<'a> {
    fn usable_width(&self) -> f32 {
        self.page_width - self.margins.left - self.margins.right
    }

    fn usable_top(&self) -> f32 {
        self.page_height - self.margins.top
    }

    fn usable_bottom(&self) -> f32 {
        self.margins.bottom
    }

    fn blank_page(&self) -> Page {
        Page {
            media_box: (0.0, 0.0, self.page_width, self.page_height),
            instructions: Vec::new(),
            link_annotations: Vec::new(),
            form_widgets: Vec::new(),
            dest_anchors: Vec::new(),
        }
    }

    fn resolve_font(&mut self, props: &CellProps) -> ResolvedFont {
        let resolved = self.fonts.resolve(&props.font, props.bold, props.italic);
        let known = STANDARD_ALIASES.contains(&props.font.to_ascii_lowercase().as_str());
        if !self.fonts.contains(&props.font) && !known {
            self.diagnostics.push(Warning::FontNotFound { requested: props.font.clone(), substituted: "Helvetica" });
        }
        resolved
    }

    fn register_image(&mut self, resource: ImageResource) -> usize {
        if let Some(pos) = self.images.iter().position(|r| r.content_hash == resource.content_hash) {
            pos
        } else {
            self.images.push(resource);
            self.images.len() - 1
        }
    }

    fn start_new_page(&mut self) {
        self.finish_current_page();
        self.cursor_y = self.usable_top();
    }

    fn finish_current_page(&mut self) {
        self.draw_page_chrome();
        let finished = std::mem::replace(&mut self.cur, self.blank_page());
        self.pages.push(finished);
    }

    fn draw_page_chrome(&mut self) {
        let page_number = self.pages.len() + 1;
        let b = self.borders;
        if b.left > 0 || b.right > 0 || b.top > 0 || b.bottom > 0 {
            let x0 = b.left as f32;
            let y0 = b.bottom as f32;
            let x1 = self.page_width - b.right as f32;
            let y1 = self.page_height - b.top as f32;
            self.cur.instructions.push(Instruction::Line { x0, y0, x1, y1: y0, width: 1.0 });
            self.cur.instructions.push(Instruction::Line { x0, y0: y1, x1, y1, width: 1.0 });
            self.cur.instructions.push(Instruction::Line { x0, y0, x1: x0, y1, width: 1.0 });
            self.cur.instructions.push(Instruction::Line { x0: x1, y0, x1, y1, width: 1.0 });
        }
        if let Some(watermark) = self.watermark.clone() {
            self.cur.instructions.push(Instruction::RotatedText {
                x: self.page_width / 2.0,
                y: self.page_height / 2.0,
                font: ResolvedFont::Standard(Standard14::Helvetica),
                size: WATERMARK_SIZE,
                color: RGBA(0.7, 0.7, 0.7, 1.0),
                angle_degrees: 45.0,
                text: watermark,
            });
        }
        if let Some(footer) = self.footer.clone() {
            let font = self.fonts.resolve(&footer.font, false, false);
            self.usage.record(FontKey::for_resolution(&footer.font, &font), &font, &footer.text);
            self.cur.instructions.push(Instruction::Text {
                x: self.margins.left,
                y: self.margins.bottom / 2.0,
                font,
                size: 10.0,
                color: RGBA::BLACK,
                text: footer.text,
            });
        }
        let page_number_font = ResolvedFont::Standard(Standard14::Helvetica);
        let marker = format!("Page {} of {}", page_number, PAGE_COUNT_PLACEHOLDER);
        self.cur.instructions.push(Instruction::Text {
            x: self.page_width - self.margins.right - 80.0,
            y: self.margins.bottom / 2.0,
            font: page_number_font,
            size: 10.0,
            color: RGBA::BLACK,
            text: marker,
        });
    }

    fn layout_row(&mut self, row: &Row, widths: &[f32], base_height: f32) -> RowLayout {
        let mut height = base_height * row.height;
        let mut cell_lines = Vec::with_capacity(row.cells.len());
        for (i, cell) in row.cells.iter().enumerate() {
            let width = widths.get(i).copied().unwrap_or(0.0);
            let lines = match &cell.text {
                Some(text) if cell.wrap => {
                    let resolved = self.resolve_font(&cell.props);
                    let max_width = (width - 2.0 * CELL_PADDING).max(1.0);
                    wrap::wrap(&resolved, cell.props.size, text, max_width)
                }
                Some(text) => vec![text.clone()],
                None => Vec::new(),
            };
            if cell.wrap && !lines.is_empty() {
                let text_height = lines.len() as f32 * cell.props.size * LINE_HEIGHT_FACTOR + 2.0 * CELL_PADDING;
                if text_height > height {
                    height = text_height;
                }
            }
            cell_lines.push(lines);
        }
        RowLayout { height, cell_lines }
    }

    fn draw_row_chunk(
        &mut self,
        row: &Row,
        widths: &[f32],
        cell_lines: &[Vec<String>],
        y_top: f32,
        height: f32,
        draw_top: bool,
        draw_bottom: bool,
    ) {
        let mut x = self.margins.left;
        let y_bottom = y_top - height;
        for (i, cell) in row.cells.iter().enumerate() {
            let w = widths.get(i).copied().unwrap_or(0.0);
            if let Some(bg) = &cell.bgcolor {
                self.cur.instructions.push(Instruction::FillRect { x, y: y_bottom, w, h: height, color: parse_color(bg) });
            }
            let resolved = self.resolve_font(&cell.props);
            let color = cell.textcolor.as_deref().map(parse_color).unwrap_or(RGBA::BLACK);
            let line_height = cell.props.size * LINE_HEIGHT_FACTOR;
            let mut line_y = y_top - CELL_PADDING - cell.props.size * 0.8;
            if let Some(lines) = cell_lines.get(i) {
                for line in lines {
                    let measured = wrap::measure_pt(&resolved, cell.props.size, line);
                    let line_x = match cell.props.align {
                        Align::Left => x + CELL_PADDING,
                        Align::Center => x + (w - measured) / 2.0,
                        Align::Right => x + w - CELL_PADDING - measured,
                    };
                    self.usage.record(FontKey::for_resolution(&cell.props.font, &resolved), &resolved, line);
                    self.cur.instructions.push(Instruction::Text {
                        x: line_x,
                        y: line_y,
                        font: resolved.clone(),
                        size: cell.props.size,
                        color,
                        text: line.clone(),
                    });
                    line_y -= line_height;
                }
            }
            let props = &cell.props;
            if props.border_top && draw_top {
                self.cur.instructions.push(Instruction::Line { x0: x, y0: y_top, x1: x + w, y1: y_top, width: 0.5 });
            }
            if props.border_bottom && draw_bottom {
                self.cur.instructions.push(Instruction::Line { x0: x, y0: y_bottom, x1: x + w, y1: y_bottom, width: 0.5 });
            }
            if props.border_left {
                self.cur.instructions.push(Instruction::Line { x0: x, y0: y_bottom, x1: x, y1: y_top, width: 0.5 });
            }
            let suppress_right =
                row.cells.get(i + 1).map(|next| next.props.border_left).unwrap_or(false) && props.border_right;
            if props.border_right && !suppress_right {
                self.cur.instructions.push(Instruction::Line { x0: x + w, y0: y_bottom, x1: x + w, y1: y_top, width: 0.5 });
            }
            x += w;
        }
    }

    fn draw_row(&mut self, row: &Row, widths: &[f32], row_layout: &RowLayout, y_top: f32, row_height: f32) {
        self.draw_row_chunk(row, widths, &row_layout.cell_lines, y_top, row_height, true, true);
        let mut x = self.margins.left;
        for (i, cell) in row.cells.iter().enumerate() {
            let w = widths.get(i).copied().unwrap_or(0.0);
            let y_bottom = y_top - row_height;
            if let Some(image) = &cell.image {
                self.draw_cell_image(image, x, y_top, w, row_height);
            }
            if let Some(dest) = &cell.dest {
                self.cur.dest_anchors.push(DestAnchor { name: dest.clone(), page_index: self.pages.len(), x, y: y_top });
            }
            if let Some(link) = &cell.link {
                let target = match link.strip_prefix('#') {
                    Some(name) => LinkTarget::Dest(name.to_owned()),
                    None => LinkTarget::Uri(link.clone()),
                };
                self.cur.link_annotations.push(LinkAnnotation { rect: (x, y_bottom, x + w, y_top), target });
            }
            if let Some(field) = &cell.form_field {
                self.cur.form_widgets.push(FormWidgetPlacement {
                    rect: (x, y_bottom, x + w, y_top),
                    field: FormFieldSpec {
                        kind: field.field_type,
                        name: field.name.clone(),
                        value: field.value.clone(),
                        checked: field.checked || cell.chequebox,
                        max_len: None,
                    },
                });
            }
            x += w;
        }
    }

    fn draw_cell_image(&mut self, image: &ImageData, cell_x: f32, cell_y_top: f32, cell_w: f32, cell_h: f32) {
        let resource = match images::decode_image(&image.name, &image.data, self.diagnostics) {
            Some(resource) => resource,
            None => return,
        };
        let index = self.register_image(resource);
        let (w, h) = images::fit_aspect(image.width, image.height, cell_w, cell_h);
        let x = cell_x + (cell_w - w) / 2.0;
        let y = cell_y_top - cell_h + (cell_h - h) / 2.0;
        self.cur.instructions.push(Instruction::Image { x, y, w, h, image_index: index });
    }

    fn draw_top_level_image(&mut self, image: &ImageData) {
        let resource = match images::decode_image(&image.name, &image.data, self.diagnostics) {
            Some(resource) => resource,
            None => return,
        };
        let index = self.register_image(resource);
        let usable_width = self.usable_width();
        let (w, h) = images::fit_aspect(image.width, image.height, usable_width, usable_width * 10.0);
        if self.cursor_y - h < self.usable_bottom() {
            self.start_new_page();
        }
        let x = self.margins.left + (usable_width - w) / 2.0;
        let y_top = self.cursor_y;
        self.cur.instructions.push(Instruction::Image { x, y: y_top - h, w, h, image_index: index });
        self.cursor_y -= h;
    }

    fn draw_spacer(&mut self, height: f32) {
        let height = height.max(0.0);
        if self.cursor_y - height < self.usable_bottom() {
            self.start_new_page();
        }
        self.cursor_y -= height;
    }

    fn draw_title_line(&mut self, styled: &StyledText) {
        let resolved = self.resolve_font(&styled.props);
        let measured = wrap::measure_pt(&resolved, styled.props.size, &styled.text);
        let usable_width = self.usable_width();
        let x = match styled.props.align {
            Align::Left => self.margins.left,
            Align::Center => self.margins.left + (usable_width - measured) / 2.0,
            Align::Right => self.margins.left + usable_width - measured,
        };
        let height = styled.props.size * LINE_HEIGHT_FACTOR;
        if self.cursor_y - height < self.usable_bottom() {
            self.start_new_page();
        }
        let y = self.cursor_y - styled.props.size * 0.8;
        let color = styled.textcolor.as_deref().map(parse_color).unwrap_or(RGBA::BLACK);
        self.usage.record(FontKey::for_resolution(&styled.props.font, &resolved), &resolved, &styled.text);
        self.cur.instructions.push(Instruction::Text { x, y, font: resolved, size: styled.props.size, color, text: styled.text.clone() });
        self.cursor_y -= height;
    }

    /// A row whose intrinsic height exceeds a full page's usable height is
    /// split at line boundaries across consecutive pages (`spec.md` §4.3
    /// "Pagination").
    fn draw_oversize_row(&mut self, row: &Row, widths: &[f32], row_layout: &RowLayout) {
        self.diagnostics.push(Warning::PageOverflowSplit { element_index: self.pages.len() });
        if (self.usable_top() - self.cursor_y).abs() > 0.01 {
            self.start_new_page();
        }
        let line_height = row.cells.iter().map(|c| c.props.size * LINE_HEIGHT_FACTOR).fold(1.0f32, f32::max);
        let usable_height = self.usable_top() - self.usable_bottom();
        let lines_per_chunk = ((usable_height - 2.0 * CELL_PADDING) / line_height).floor().max(1.0) as usize;
        let max_lines = row_layout.cell_lines.iter().map(|l| l.len()).max().unwrap_or(0).max(1);

        let mut offset = 0usize;
        while offset < max_lines {
            let end = (offset + lines_per_chunk).min(max_lines);
            let chunk_lines: Vec<Vec<String>> = row_layout
                .cell_lines
                .iter()
                .map(|lines| {
                    let s = offset.min(lines.len());
                    let e = end.min(lines.len());
                    lines[s..e].to_vec()
                })
                .collect();
            let chunk_height = (end - offset) as f32 * line_height + 2.0 * CELL_PADDING;
            let y_top = self.cursor_y;
            self.draw_row_chunk(row, widths, &chunk_lines, y_top, chunk_height, offset == 0, end == max_lines);
            self.cursor_y -= chunk_height;
            offset = end;
            if offset < max_lines {
                self.start_new_page();
            }
        }
    }

    fn draw_table(&mut self, table: &Table, is_title: bool) {
        let base_height = if is_title { TITLE_ROW_HEIGHT } else { ROW_HEIGHT };
        let usable_width = self.usable_width();
        let column_widths = resolve_column_widths(table, usable_width);
        for (row, widths) in table.rows.iter().zip(column_widths.iter()) {
            let row_layout = self.layout_row(row, widths, base_height);
            let usable_height = self.usable_top() - self.usable_bottom();
            if row_layout.height > usable_height {
                self.draw_oversize_row(row, widths, &row_layout);
                continue;
            }
            if self.cursor_y - row_layout.height < self.usable_bottom() {
                self.start_new_page();
            }
            let y_top = self.cursor_y;
            let height = row_layout.height;
            self.draw_row(row, widths, &row_layout, y_top, height);
            self.cursor_y -= height;
        }
    }
}

pub fn paginate(template: &Template, fonts: &FontRegistry, diagnostics: &mut Diagnostics) -> LayoutOutput {
    let (page_width, page_height) = template.config.page_dimensions_pt();
    let margins = template.config.margins;
    let mut builder = Builder {
        fonts,
        diagnostics,
        usage: FontUsage::new(),
        images: Vec::new(),
        pages: Vec::new(),
        page_width,
        page_height,
        margins,
        borders: template.config.page_borders,
        watermark: template.config.watermark.clone(),
        footer: template.footer.clone(),
        cur: Page {
            media_box: (0.0, 0.0, page_width, page_height),
            instructions: Vec::new(),
            link_annotations: Vec::new(),
            form_widgets: Vec::new(),
            dest_anchors: Vec::new(),
        },
        cursor_y: page_height - margins.top,
    };

    if let Some(title) = &template.title {
        match title {
            Title::Line(styled) => builder.draw_title_line(styled),
            Title::Table(table) => builder.draw_table(table, true),
        }
    }
    for element in &template.elements {
        match element {
            Element::Table { table } => builder.draw_table(table, false),
            Element::Spacer { spacer } => builder.draw_spacer(spacer.height),
            Element::Image { image } => builder.draw_top_level_image(image),
        }
    }
    builder.finish_current_page();

    let total = builder.pages.len();
    for page in &mut builder.pages {
        for instruction in &mut page.instructions {
            if let Instruction::Text { text, .. } = instruction {
                if text.contains(PAGE_COUNT_PLACEHOLDER) {
                    *text = text.replace(PAGE_COUNT_PLACEHOLDER, &total.to_string());
                }
            }
        }
    }

    LayoutOutput { pages: builder.pages, images: builder.images, usage: builder.usage }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontRegistry;

    fn minimal_template() -> Template {
        let json = br#"{
            "config": {"page": "A4", "pageAlignment": 1},
            "title": {"props": "Helvetica:18:100:center:0:0:0:0", "text": "Hello"}
        }"#;
        Template::from_json(json).unwrap()
    }

    #[test]
    fn minimal_title_produces_one_page() {
        let template = minimal_template();
        let fonts = FontRegistry::new();
        let mut diagnostics = Diagnostics::new();
        let output = paginate(&template, &fonts, &mut diagnostics);
        assert_eq!(output.pages.len(), 1);
        assert_eq!(output.pages[0].media_box, (0.0, 0.0, 595.0, 842.0));
    }

    #[test]
    fn two_hundred_rows_overflow_onto_multiple_pages() {
        let mut rows = Vec::new();
        for i in 0..200 {
            rows.push(format!(
                r#"{{"height":1.0,"cells":[{{"props":"Helvetica:12:000:left:0:0:0:0","text":"row {}"}}]}}"#,
                i
            ));
        }
        let json = format!(
            r#"{{"config":{{"page":"A4","pageAlignment":1}},"elements":[{{"type":"table","table":{{"maxcolumns":1,"columnwidths":[1.0],"rows":[{}]}}}}]}}"#,
            rows.join(",")
        );
        let template = Template::from_json(json.as_bytes()).unwrap();
        let fonts = FontRegistry::new();
        let mut diagnostics = Diagnostics::new();
        let output = paginate(&template, &fonts, &mut diagnostics);
        assert!(output.pages.len() >= 6);
    }
}
