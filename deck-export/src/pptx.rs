//! PowerPoint (Office Open XML) writer.
//!
//! Writes the smallest package PowerPoint opens without repair: content
//! types, package relationships, document properties, one presentation
//! part, one master with a blank layout, a theme, and a part per page.
//! Images are linked externally by URL. Cover images are cropped with a
//! source rectangle; contain images get a frame shrunk to their aspect.

use std::fmt::Write as _;
use std::io::{Seek, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use deck_core::{image_cover_fit, DocRect, PixelRect, Size};

use crate::document::{Deck, HAlign, ImageBox, ImageSizing, Page, Primitive, ShapeBox, TextBox, VAlign};
use crate::error::ExportResult;
use crate::svg::escape_xml;

/// English Metric Units per document unit (inch).
pub const EMU_PER_UNIT: f64 = 914_400.0;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Convert document units to EMU.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn emu(value: f64) -> i64 {
    if value.is_finite() {
        (value * EMU_PER_UNIT).round() as i64
    } else {
        0
    }
}

/// Streams a [`Deck`] into a PPTX archive.
pub struct PptxWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: FileOptions,
}

impl<W: Write + Seek> PptxWriter<W> {
    /// Create a writer over `inner`.
    pub fn new(inner: W) -> Self {
        Self {
            zip: ZipWriter::new(inner),
            options: FileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    /// Write every part of the package and finish the archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive or any part cannot be written.
    pub fn write(mut self, deck: &Deck) -> ExportResult<W> {
        let count = deck.pages.len();

        self.part("[Content_Types].xml", &content_types(count)?)?;
        self.part("_rels/.rels", &package_rels())?;
        self.part("docProps/app.xml", &app_props(count))?;
        self.part("docProps/core.xml", &core_props(&deck.title))?;
        self.part("ppt/presentation.xml", &presentation(deck)?)?;
        self.part("ppt/_rels/presentation.xml.rels", &presentation_rels(count)?)?;
        self.part("ppt/slideMasters/slideMaster1.xml", SLIDE_MASTER)?;
        self.part("ppt/slideMasters/_rels/slideMaster1.xml.rels", MASTER_RELS)?;
        self.part("ppt/slideLayouts/slideLayout1.xml", SLIDE_LAYOUT)?;
        self.part("ppt/slideLayouts/_rels/slideLayout1.xml.rels", LAYOUT_RELS)?;
        self.part("ppt/theme/theme1.xml", THEME)?;

        for (i, page) in deck.pages.iter().enumerate() {
            let number = i + 1;
            let (xml, links) = slide_xml(page)?;
            self.part(&format!("ppt/slides/slide{number}.xml"), &xml)?;
            self.part(
                &format!("ppt/slides/_rels/slide{number}.xml.rels"),
                &slide_rels(&links)?,
            )?;
        }

        tracing::debug!("Wrote PPTX package with {} slides", count);
        Ok(self.zip.finish()?)
    }

    fn part(&mut self, name: &str, content: &str) -> ExportResult<()> {
        self.zip.start_file(name, self.options)?;
        self.zip.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn content_types(slide_count: usize) -> ExportResult<String> {
    let mut xml = format!(
        "{XML_DECL}<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
         <Override PartName=\"/ppt/presentation.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml\"/>\
         <Override PartName=\"/ppt/slideMasters/slideMaster1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml\"/>\
         <Override PartName=\"/ppt/slideLayouts/slideLayout1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml\"/>\
         <Override PartName=\"/ppt/theme/theme1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.theme+xml\"/>\
         <Override PartName=\"/docProps/app.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.extended-properties+xml\"/>\
         <Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>"
    );
    for i in 1..=slide_count {
        write!(
            xml,
            "<Override PartName=\"/ppt/slides/slide{i}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slide+xml\"/>"
        )?;
    }
    xml.push_str("</Types>");
    Ok(xml)
}

fn package_rels() -> String {
    format!(
        "{XML_DECL}<Relationships xmlns=\"{NS_RELS}\">\
         <Relationship Id=\"rId1\" Type=\"{REL_BASE}/officeDocument\" Target=\"ppt/presentation.xml\"/>\
         <Relationship Id=\"rId2\" Type=\"{REL_BASE}/extended-properties\" Target=\"docProps/app.xml\"/>\
         <Relationship Id=\"rId3\" Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties\" Target=\"docProps/core.xml\"/>\
         </Relationships>"
    )
}

fn app_props(slide_count: usize) -> String {
    format!(
        "{XML_DECL}<Properties xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/extended-properties\">\
         <Application>Saorsa Deck</Application><Slides>{slide_count}</Slides></Properties>"
    )
}

fn core_props(title: &str) -> String {
    let title = escape_xml(title);
    format!(
        "{XML_DECL}<cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\
         <dc:title>{title}</dc:title><dc:creator>Saorsa Deck</dc:creator></cp:coreProperties>"
    )
}

fn presentation(deck: &Deck) -> ExportResult<String> {
    let mut xml = format!(
        "{XML_DECL}<p:presentation xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\">\
         <p:sldMasterIdLst><p:sldMasterId id=\"2147483648\" r:id=\"rId1\"/></p:sldMasterIdLst><p:sldIdLst>"
    );
    for i in 1..=deck.pages.len() {
        write!(xml, "<p:sldId id=\"{}\" r:id=\"rId{}\"/>", 255 + i, i + 2)?;
    }
    write!(
        xml,
        "</p:sldIdLst><p:sldSz cx=\"{}\" cy=\"{}\"/><p:notesSz cx=\"6858000\" cy=\"9144000\"/></p:presentation>",
        emu(deck.width),
        emu(deck.height)
    )?;
    Ok(xml)
}

fn presentation_rels(slide_count: usize) -> ExportResult<String> {
    let mut xml = format!(
        "{XML_DECL}<Relationships xmlns=\"{NS_RELS}\">\
         <Relationship Id=\"rId1\" Type=\"{REL_BASE}/slideMaster\" Target=\"slideMasters/slideMaster1.xml\"/>\
         <Relationship Id=\"rId2\" Type=\"{REL_BASE}/theme\" Target=\"theme/theme1.xml\"/>"
    );
    for i in 1..=slide_count {
        write!(
            xml,
            "<Relationship Id=\"rId{}\" Type=\"{REL_BASE}/slide\" Target=\"slides/slide{i}.xml\"/>",
            i + 2
        )?;
    }
    xml.push_str("</Relationships>");
    Ok(xml)
}

fn slide_rels(image_links: &[String]) -> ExportResult<String> {
    let mut xml = format!(
        "{XML_DECL}<Relationships xmlns=\"{NS_RELS}\">\
         <Relationship Id=\"rId1\" Type=\"{REL_BASE}/slideLayout\" Target=\"../slideLayouts/slideLayout1.xml\"/>"
    );
    for (i, link) in image_links.iter().enumerate() {
        write!(
            xml,
            "<Relationship Id=\"rId{}\" Type=\"{REL_BASE}/image\" Target=\"{}\" TargetMode=\"External\"/>",
            i + 2,
            escape_xml(link)
        )?;
    }
    xml.push_str("</Relationships>");
    Ok(xml)
}

/// Slide XML plus the external image URLs it references, in `rId2..` order.
fn slide_xml(page: &Page) -> ExportResult<(String, Vec<String>)> {
    let mut xml = format!("{XML_DECL}<p:sld xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\"><p:cSld>");
    if let Some(bg) = &page.background {
        write!(
            xml,
            "<p:bg><p:bgPr><a:solidFill><a:srgbClr val=\"{bg}\"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"
        )?;
    }
    xml.push_str(
        "<p:spTree><p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>",
    );

    let mut links = Vec::new();
    for (i, primitive) in page.primitives.iter().enumerate() {
        let id = i + 2;
        match primitive {
            Primitive::Text(text) => text_shape(&mut xml, id, text)?,
            Primitive::Shape(shape) => rounded_rect(&mut xml, id, shape)?,
            Primitive::Image(image) => {
                links.push(image.src.clone());
                picture(&mut xml, id, links.len() + 1, image)?;
            }
        }
    }

    xml.push_str("</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>");
    Ok((xml, links))
}

fn xfrm(xml: &mut String, rect: &DocRect) -> std::fmt::Result {
    write!(
        xml,
        "<a:xfrm><a:off x=\"{}\" y=\"{}\"/><a:ext cx=\"{}\" cy=\"{}\"/></a:xfrm>",
        emu(rect.x),
        emu(rect.y),
        emu(rect.w.max(0.0)),
        emu(rect.h.max(0.0))
    )
}

fn text_shape(xml: &mut String, id: usize, text: &TextBox) -> ExportResult<()> {
    write!(
        xml,
        "<p:sp><p:nvSpPr><p:cNvPr id=\"{id}\" name=\"TextBox {id}\"/><p:cNvSpPr txBox=\"1\"/><p:nvPr/></p:nvSpPr><p:spPr>"
    )?;
    xfrm(xml, &text.rect)?;
    let anchor = match text.valign {
        VAlign::Top => "t",
        VAlign::Middle => "ctr",
    };
    let align = match text.align {
        HAlign::Left => "l",
        HAlign::Center => "ctr",
    };
    write!(
        xml,
        "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>\
         <p:txBody><a:bodyPr wrap=\"square\" lIns=\"0\" tIns=\"0\" rIns=\"0\" bIns=\"0\" anchor=\"{anchor}\"/><a:lstStyle/>\
         <a:p><a:pPr algn=\"{align}\"/>"
    )?;
    for run in &text.runs {
        write!(
            xml,
            "<a:r><a:rPr lang=\"en-US\" sz=\"{}\" b=\"{}\" dirty=\"0\"><a:solidFill><a:srgbClr val=\"{}\"/></a:solidFill>\
             <a:latin typeface=\"{}\"/></a:rPr><a:t>{}</a:t></a:r>",
            run.font_size * 100,
            u8::from(run.bold),
            run.color,
            escape_xml(&run.font_face),
            escape_xml(&run.text)
        )?;
    }
    xml.push_str("</a:p></p:txBody></p:sp>");
    Ok(())
}

fn rounded_rect(xml: &mut String, id: usize, shape: &ShapeBox) -> ExportResult<()> {
    // roundRect's adjust value is the radius as a fraction of the short side,
    // in 1/100000ths, capped at a half.
    let short = shape.rect.w.min(shape.rect.h);
    let adjust = if short > 0.0 {
        (shape.corner_radius / short * 100_000.0).clamp(0.0, 50_000.0)
    } else {
        0.0
    };
    write!(
        xml,
        "<p:sp><p:nvSpPr><p:cNvPr id=\"{id}\" name=\"Shape {id}\"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr>"
    )?;
    xfrm(xml, &shape.rect)?;
    write!(
        xml,
        "<a:prstGeom prst=\"roundRect\"><a:avLst><a:gd name=\"adj\" fmla=\"val {adjust:.0}\"/></a:avLst></a:prstGeom>\
         <a:solidFill><a:srgbClr val=\"{}\"/></a:solidFill><a:ln><a:noFill/></a:ln></p:spPr></p:sp>",
        shape.fill
    )?;
    Ok(())
}

fn picture(xml: &mut String, id: usize, rel: usize, image: &ImageBox) -> ExportResult<()> {
    let sizing = match image.sizing {
        ImageSizing::Cover => "cover",
        ImageSizing::Contain => "contain",
    };
    let fitted = fit_image(image);
    write!(
        xml,
        "<p:pic><p:nvPicPr><p:cNvPr id=\"{id}\" name=\"Picture {id}\" descr=\"{sizing}\"/>\
         <p:cNvPicPr><a:picLocks noChangeAspect=\"1\"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>\
         <p:blipFill><a:blip r:link=\"rId{rel}\"/>"
    )?;
    if let Some(crop) = fitted.crop {
        write!(
            xml,
            "<a:srcRect l=\"{}\" t=\"{}\" r=\"{}\" b=\"{}\"/>",
            crop.horizontal, crop.vertical, crop.horizontal, crop.vertical
        )?;
    }
    xml.push_str("<a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr>");
    xfrm(xml, &fitted.frame)?;
    xml.push_str("<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></p:spPr></p:pic>");
    Ok(())
}

/// Crop per side in 1/100000ths of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Crop {
    horizontal: i64,
    vertical: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FittedImage {
    frame: DocRect,
    crop: Option<Crop>,
}

/// Frame and crop that show an image of `image.aspect` in its box without
/// distortion.
///
/// Images whose box or aspect is unusable are stretched to the box.
#[allow(clippy::cast_possible_truncation)]
fn fit_image(image: &ImageBox) -> FittedImage {
    let rect = image.rect;
    let stretched = FittedImage {
        frame: rect,
        crop: None,
    };
    if !(image.aspect.is_finite() && image.aspect > 0.0 && rect.w > 0.0 && rect.h > 0.0) {
        return stretched;
    }

    match image.sizing {
        ImageSizing::Cover => {
            let bounds = PixelRect::new(rect.x, rect.y, rect.w, rect.h);
            let placed = image_cover_fit(Size::new(image.aspect, 1.0), &bounds);
            let share = |overflow: f64, extent: f64| (overflow / extent * 100_000.0).round() as i64;
            FittedImage {
                frame: rect,
                crop: Some(Crop {
                    horizontal: share(bounds.left - placed.left, placed.width),
                    vertical: share(bounds.top - placed.top, placed.height),
                }),
            }
        }
        ImageSizing::Contain => {
            let frame = if image.aspect > rect.w / rect.h {
                let h = rect.w / image.aspect;
                DocRect::new(rect.x, rect.y + (rect.h - h) / 2.0, rect.w, h)
            } else {
                let w = rect.h * image.aspect;
                DocRect::new(rect.x + (rect.w - w) / 2.0, rect.y, w, rect.h)
            };
            FittedImage { frame, crop: None }
        }
    }
}

const SLIDE_MASTER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>
<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld>
<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>
<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>
</p:sldMaster>"#;

const MASTER_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/>
</Relationships>"#;

const SLIDE_LAYOUT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="blank" preserve="1">
<p:cSld name="Blank"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld>
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sldLayout>"#;

const LAYOUT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="../slideMasters/slideMaster1.xml"/>
</Relationships>"#;

const THEME: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Deck">
<a:themeElements>
<a:clrScheme name="Deck">
<a:dk1><a:srgbClr val="000000"/></a:dk1><a:lt1><a:srgbClr val="FFFFFF"/></a:lt1>
<a:dk2><a:srgbClr val="1F2937"/></a:dk2><a:lt2><a:srgbClr val="F3F4F6"/></a:lt2>
<a:accent1><a:srgbClr val="2563EB"/></a:accent1><a:accent2><a:srgbClr val="7C3AED"/></a:accent2>
<a:accent3><a:srgbClr val="059669"/></a:accent3><a:accent4><a:srgbClr val="D97706"/></a:accent4>
<a:accent5><a:srgbClr val="DC2626"/></a:accent5><a:accent6><a:srgbClr val="0891B2"/></a:accent6>
<a:hlink><a:srgbClr val="2563EB"/></a:hlink><a:folHlink><a:srgbClr val="7C3AED"/></a:folHlink>
</a:clrScheme>
<a:fontScheme name="Deck">
<a:majorFont><a:latin typeface="Inter"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>
<a:minorFont><a:latin typeface="Inter"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>
</a:fontScheme>
<a:fmtScheme name="Deck">
<a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst>
<a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst>
<a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst>
<a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst>
</a:fmtScheme>
</a:themeElements>
</a:theme>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentBuilder, TextRun};
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    fn sample_deck() -> Deck {
        let mut deck = Deck::new("Q3 <Review>", 10.0, 5.625);
        deck.begin_page(1, Some("FFFFFF".to_string()));
        deck.add_text(TextBox {
            rect: DocRect::new(0.5, 0.5, 9.0, 1.0),
            runs: vec![TextRun {
                text: "Revenue & growth".to_string(),
                font_face: "Inter".to_string(),
                font_size: 28,
                color: "1F2937".to_string(),
                bold: true,
            }],
            align: HAlign::Left,
            valign: VAlign::Top,
        });
        deck.add_image(ImageBox {
            rect: DocRect::new(5.0, 1.5, 4.0, 3.0),
            src: "https://img.example/chart.png?a=1&b=2".to_string(),
            sizing: ImageSizing::Contain,
            aspect: 1.0,
        });
        deck.add_shape(ShapeBox {
            rect: DocRect::new(1.0, 2.0, 0.5, 0.4),
            fill: "2563EB".to_string(),
            corner_radius: 0.2,
        });
        deck
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_emu_conversion() {
        assert_eq!(emu(1.0), 914_400);
        assert_eq!(emu(5.625), 5_143_500);
        assert_eq!(emu(f64::NAN), 0);
    }

    #[test]
    fn test_package_parts() {
        let bytes = PptxWriter::new(Cursor::new(Vec::new()))
            .write(&sample_deck())
            .unwrap()
            .into_inner();

        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/_rels/slide1.xml.rels",
            "ppt/theme/theme1.xml",
        ] {
            assert!(names.contains(&part), "missing {part}");
        }

        let presentation = read_part(&bytes, "ppt/presentation.xml");
        assert!(presentation.contains("<p:sldSz cx=\"9144000\" cy=\"5143500\"/>"));
        let core = read_part(&bytes, "docProps/core.xml");
        assert!(core.contains("Q3 &lt;Review&gt;"));
    }

    #[test]
    fn test_slide_content() {
        let bytes = PptxWriter::new(Cursor::new(Vec::new()))
            .write(&sample_deck())
            .unwrap()
            .into_inner();

        let slide = read_part(&bytes, "ppt/slides/slide1.xml");
        assert!(slide.contains("<a:srgbClr val=\"FFFFFF\"/>"));
        assert!(slide.contains("<a:off x=\"457200\" y=\"457200\"/>"));
        assert!(slide.contains("sz=\"2800\" b=\"1\""));
        assert!(slide.contains("<a:t>Revenue &amp; growth</a:t>"));
        assert!(slide.contains("r:link=\"rId2\""));
        assert!(slide.contains("prst=\"roundRect\""));
        assert!(slide.contains("fmla=\"val 50000\""));

        let rels = read_part(&bytes, "ppt/slides/_rels/slide1.xml.rels");
        assert!(rels.contains("Target=\"https://img.example/chart.png?a=1&amp;b=2\" TargetMode=\"External\""));
    }

    #[test]
    fn test_contain_image_frame_keeps_aspect() {
        let bytes = PptxWriter::new(Cursor::new(Vec::new()))
            .write(&sample_deck())
            .unwrap()
            .into_inner();

        // square image in a 4 x 3 box: 3 x 3 frame centred horizontally
        let slide = read_part(&bytes, "ppt/slides/slide1.xml");
        let picture = &slide[slide.find("<p:pic>").unwrap()..];
        assert!(picture.contains("<a:off x=\"5029200\" y=\"1371600\"/><a:ext cx=\"2743200\" cy=\"2743200\"/>"));
        assert!(!picture.contains("<a:srcRect"));
    }

    #[test]
    fn test_cover_image_is_cropped_not_stretched() {
        let mut deck = Deck::new("Cover", 10.0, 5.625);
        deck.begin_page(1, None);
        deck.add_image(ImageBox {
            rect: DocRect::new(0.5, 1.0, 9.0, 2.0),
            src: "https://img.example/wide.png".to_string(),
            sizing: ImageSizing::Cover,
            aspect: 1.0,
        });
        deck.add_image(ImageBox {
            rect: DocRect::new(0.5, 3.5, 2.0, 2.0),
            src: "https://img.example/pano.png".to_string(),
            sizing: ImageSizing::Cover,
            aspect: 4.0,
        });
        let bytes = PptxWriter::new(Cursor::new(Vec::new()))
            .write(&deck)
            .unwrap()
            .into_inner();

        let slide = read_part(&bytes, "ppt/slides/slide1.xml");
        // square source in a 9 x 2 box keeps 2/9 of its height
        assert!(slide.contains("<a:srcRect l=\"0\" t=\"38889\" r=\"0\" b=\"38889\"/>"));
        assert!(slide.contains("<a:off x=\"457200\" y=\"914400\"/><a:ext cx=\"8229600\" cy=\"1828800\"/>"));
        // 4:1 source in a square box keeps a quarter of its width
        assert!(slide.contains("<a:srcRect l=\"37500\" t=\"0\" r=\"37500\" b=\"0\"/>"));
    }

    #[test]
    fn test_unusable_aspect_stretches_to_box() {
        let image = ImageBox {
            rect: DocRect::new(1.0, 1.0, 4.0, 2.0),
            src: "a.png".to_string(),
            sizing: ImageSizing::Cover,
            aspect: f64::NAN,
        };
        let fitted = fit_image(&image);
        assert_eq!(fitted.frame, image.rect);
        assert_eq!(fitted.crop, None);
    }
}
