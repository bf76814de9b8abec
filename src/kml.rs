//! Very simple functions for producing KML files of cluster markers.
//!
//! This is not a general solution at all. It is a streaming writer, the user is responsible for
//! closing all the tags that get opened. The [ClusterRenderer] trait puts it together to draw a
//! whole [ClusterList].

use crate::{
    area::PopupDetails,
    cluster::{cluster_color, cluster_scale, popup_content, ClusterList},
    AreaClusterResult,
};
use chrono::{DateTime, Utc};
use std::{
    borrow::Cow,
    fmt::Write as _,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

const SINGLE_ICON: &str = "http://maps.google.com/mapfiles/kml/shapes/parking_lot.png";
const CLUSTER_ICON: &str = "http://maps.google.com/mapfiles/kml/paddle/wht-circle.png";

pub struct KmlFile(BufWriter<File>);

impl KmlFile {
    pub fn new<P: AsRef<Path>>(pth: P) -> AreaClusterResult<Self> {
        let p = pth.as_ref();

        let f = std::fs::File::create(p)?;
        let mut new = KmlFile(BufWriter::new(f));
        new.start_document()?;
        Ok(new)
    }
}

impl KmlWriter for KmlFile {
    fn output(&mut self) -> &mut dyn Write {
        &mut self.0
    }
}

impl Drop for KmlFile {
    fn drop(&mut self) {
        self.finish_document();
        if let Err(err) = self.0.flush() {
            log::error!("Error flushing KML file: {}", err);
        }
    }
}

/// A zipped KML file with a single doc.kml entry.
pub struct KmzFile(zip::ZipWriter<File>);

impl KmzFile {
    pub fn new<P: AsRef<Path>>(pth: P) -> AreaClusterResult<Self> {
        let p = pth.as_ref();

        let f = std::fs::File::create(p)?;
        let mut writer = zip::ZipWriter::new(f);
        writer.start_file("doc.kml", zip::write::FileOptions::default())?;

        let mut new = KmzFile(writer);
        new.start_document()?;
        Ok(new)
    }
}

impl KmlWriter for KmzFile {
    fn output(&mut self) -> &mut dyn Write {
        &mut self.0
    }
}

impl Drop for KmzFile {
    fn drop(&mut self) {
        self.finish_document();
        if let Err(err) = self.0.finish() {
            log::error!("Error finishing KMZ file: {}", err);
        }
    }
}

/// Escape the characters that would break an XML text node.
fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }

    Cow::Owned(escaped)
}

/// Split any "]]>" so the text can't close the CDATA section it is written into.
fn cdata(text: &str) -> Cow<'_, str> {
    if text.contains("]]>") {
        Cow::Owned(text.replace("]]>", "]]]]><![CDATA[>"))
    } else {
        Cow::Borrowed(text)
    }
}

pub trait KmlWriter {
    fn output(&mut self) -> &mut dyn Write;

    /// Open a file for output and start by putting the header out.
    fn start_document(&mut self) -> AreaClusterResult<()> {
        const HEADER: &str = concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "\n",
            r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#,
            "\n",
            "<Document>\n"
        );

        self.output().write_all(HEADER.as_bytes())?;

        Ok(())
    }

    /// Close a document.
    fn finish_document(&mut self) {
        const FOOTER: &str = concat!(r#"</Document>"#, "\n", r#"</kml>"#, "\n");
        let _ = self.output().write_all(FOOTER.as_bytes());
    }

    /// Write a description element to the file.
    fn write_description(&mut self, description: &str) -> AreaClusterResult<()> {
        writeln!(
            self.output(),
            "<description><![CDATA[{}]]></description>",
            cdata(description)
        )?;
        Ok(())
    }

    /// Start a KML folder.
    fn start_folder(
        &mut self,
        name: Option<&str>,
        description: Option<&str>,
    ) -> AreaClusterResult<()> {
        self.output().write_all("<Folder>\n".as_bytes())?;

        if let Some(name) = name {
            writeln!(self.output(), "<name>{}</name>", escape(name))?;
        }

        if let Some(description) = description {
            self.write_description(description)?;
        }

        Ok(())
    }

    /// Close out a folder element
    fn finish_folder(&mut self) -> AreaClusterResult<()> {
        writeln!(self.output(), "</Folder>")?;
        Ok(())
    }

    /// Start a placemark element.
    fn start_placemark(
        &mut self,
        name: Option<&str>,
        description: Option<&str>,
    ) -> AreaClusterResult<()> {
        writeln!(self.output(), "<Placemark>")?;

        if let Some(name) = name {
            writeln!(self.output(), "<name>{}</name>", escape(name))?;
        }

        if let Some(description) = description {
            self.write_description(description)?;
        }

        Ok(())
    }

    /// Close out a placemark element.
    fn finish_placemark(&mut self) -> AreaClusterResult<()> {
        writeln!(self.output(), "</Placemark>")?;
        Ok(())
    }

    /// Start an inline style definition.
    fn start_style(&mut self) -> AreaClusterResult<()> {
        writeln!(self.output(), "<Style>")?;
        Ok(())
    }

    /// Close out a style definition.
    fn finish_style(&mut self) -> AreaClusterResult<()> {
        writeln!(self.output(), "</Style>")?;
        Ok(())
    }

    /// Create an IconStyle element.
    ///
    /// These should ONLY go inside a style element. The color is in the KML aabbggrr format.
    fn create_icon_style(
        &mut self,
        icon_url: Option<&str>,
        scale: f64,
        color: Option<&str>,
    ) -> AreaClusterResult<()> {
        writeln!(self.output(), "<IconStyle>")?;

        if let Some(color) = color {
            writeln!(self.output(), "<color>{}</color>", color)?;
        }

        if scale > 0.0 {
            writeln!(self.output(), "<scale>{}</scale>", scale)?;
        } else {
            writeln!(self.output(), "<scale>1</scale>")?;
        }

        if let Some(icon_url) = icon_url {
            writeln!(self.output(), "<Icon><href>{}</href></Icon>", icon_url)?;
        }

        writeln!(self.output(), "</IconStyle>")?;
        Ok(())
    }

    /// Write out a TimeStamp element.
    fn timestamp(&mut self, when: DateTime<Utc>) -> AreaClusterResult<()> {
        writeln!(
            self.output(),
            "<TimeStamp><when>{}</when></TimeStamp>",
            when.format("%Y-%m-%dT%H:%M:%S.000Z")
        )?;
        Ok(())
    }

    /// Write out a KML Point element
    fn create_point(&mut self, lat: f64, lon: f64, z: f64) -> AreaClusterResult<()> {
        writeln!(
            self.output(),
            "<Point>\n<coordinates>{},{},{}</coordinates>\n</Point>",
            lon,
            lat,
            z
        )?;
        Ok(())
    }
}

/// Something that can draw the markers for a clustering pass.
pub trait ClusterRenderer {
    fn render<D: PopupDetails>(&mut self, clusters: &ClusterList<'_, D>) -> AreaClusterResult<()>;
}

impl<W: KmlWriter> ClusterRenderer for W {
    /// Draw one folder for the pass with a placemark per cluster.
    fn render<D: PopupDetails>(&mut self, clusters: &ClusterList<'_, D>) -> AreaClusterResult<()> {
        let name = format!("Zoom {}", clusters.zoom);
        let description = format!(
            concat!(
                "Clusters: {}<br/>",
                "Areas: {}<br/>",
                "Excluded: {}<br/>",
                "Total vagas: {}<br/>",
                "Merge distance: {} m"
            ),
            clusters.len(),
            clusters.total_areas(),
            clusters.excluded,
            clusters.total_capacity(),
            clusters.threshold_m
        );

        self.start_folder(Some(&name), Some(&description))?;
        self.timestamp(clusters.generated)?;

        let mut popup = String::with_capacity(256);
        for cluster in clusters.iter() {
            popup.clear();
            let _ = write!(&mut popup, "{}", popup_content(cluster));

            let color = cluster_color(cluster.len());
            let scale = cluster_scale(cluster.len(), clusters.zoom);
            let icon = if cluster.is_cluster() {
                CLUSTER_ICON
            } else {
                SINGLE_ICON
            };

            self.start_placemark(Some(&cluster.label()), Some(&popup))?;
            self.start_style()?;
            self.create_icon_style(Some(icon), scale, Some(color.kml_color()))?;
            self.finish_style()?;

            let centroid = cluster.centroid();
            self.create_point(centroid.lat, centroid.lon, 0.0)?;
            self.finish_placemark()?;
        }

        self.finish_folder()?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::area::{Address, AreaPoint};

    struct KmlBuffer(Vec<u8>);

    impl KmlWriter for KmlBuffer {
        fn output(&mut self) -> &mut dyn Write {
            &mut self.0
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("A-1"), "A-1");
        assert_eq!(escape("R&D <1>"), "R&amp;D &lt;1&gt;");
    }

    #[test]
    fn test_render_clusters() {
        let points: Vec<AreaPoint> = vec![
            AreaPoint::new(1, -22.9068, -43.1729, Some(5)).with_code("A&B"),
            AreaPoint::new(2, -22.9070, -43.1730, Some(3)),
            AreaPoint::new(3, -22.9500, -43.2000, Some(10)).with_code("C3"),
        ];
        let list = ClusterList::from_area_points(&points, 15);

        let mut buf = KmlBuffer(vec![]);
        buf.start_document().unwrap();
        buf.render(&list).unwrap();
        buf.finish_document();

        let text = String::from_utf8(buf.0).unwrap();
        assert!(text.starts_with("<?xml"));
        assert!(text.contains("<name>Zoom 15</name>"));
        assert_eq!(text.matches("<Placemark>").count(), 2);
        assert!(text.contains("<name>2</name>"));
        assert!(text.contains("<name>C3</name>"));
        assert!(text.contains("2 areas<br/>Total vagas: 8<br/>Codes: A&B"));
        assert!(text.contains("<color>ff47a043</color>"));
        assert!(text.contains("<color>ffe5881e</color>"));
        assert!(text.contains("<coordinates>-43.2,-22.95,0</coordinates>"));
        assert!(text.trim_end().ends_with("</kml>"));
    }

    #[test]
    fn test_cdata() {
        assert_eq!(cdata("Vagas: 4"), "Vagas: 4");
        assert_eq!(cdata("a]]>b"), "a]]]]><![CDATA[>b");
        assert_eq!(cdata("]]>]]>"), "]]]]><![CDATA[>]]]]><![CDATA[>");
    }

    #[test]
    fn test_description_cannot_close_cdata() {
        let points = vec![AreaPoint::<()>::new(1, -22.9, -43.1, None).with_details(Address {
            street: Some("Rua ]]><b>x</b> & <y".to_owned()),
            ..Address::default()
        })];
        let list = ClusterList::from_area_points(&points, 15);

        let mut buf = KmlBuffer(vec![]);
        buf.render(&list).unwrap();
        let text = String::from_utf8(buf.0).unwrap();

        let line = text
            .lines()
            .find(|line| line.starts_with("<description>") && line.contains("Rua"))
            .unwrap();
        assert_eq!(
            line,
            concat!(
                "<description><![CDATA[Area 1<br/>Vagas: 0<br/>Rua ]]]]><![CDATA[>",
                "<b>x</b> & <y]]></description>"
            )
        );

        // Joining the CDATA sections back together gives the popup text.
        let inner = line
            .trim_start_matches("<description><![CDATA[")
            .trim_end_matches("]]></description>");
        assert_eq!(
            inner.replace("]]><![CDATA[", ""),
            "Area 1<br/>Vagas: 0<br/>Rua ]]><b>x</b> & <y"
        );
    }
}
