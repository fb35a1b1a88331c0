//! Embedded sitemaps.org schemas.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Permitted `changefreq` values, in schema order
pub const CHANGE_FREQUENCIES: [&str; 7] = [
    "always", "hourly", "daily", "weekly", "monthly", "yearly", "never",
];

pub const URLSET_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
           targetNamespace="http://www.sitemaps.org/schemas/sitemap/0.9"
           elementFormDefault="qualified">
  <xs:element name="urlset">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="url" maxOccurs="unbounded">
          <xs:complexType>
            <xs:sequence>
              <xs:element name="loc" type="xs:anyURI" />
              <xs:element name="lastmod" type="xs:date" minOccurs="0" />
              <xs:element name="changefreq" minOccurs="0">
                <xs:simpleType>
                  <xs:restriction base="xs:string">
                    <xs:enumeration value="always" />
                    <xs:enumeration value="hourly" />
                    <xs:enumeration value="daily" />
                    <xs:enumeration value="weekly" />
                    <xs:enumeration value="monthly" />
                    <xs:enumeration value="yearly" />
                    <xs:enumeration value="never" />
                  </xs:restriction>
                </xs:simpleType>
              </xs:element>
              <xs:element name="priority" minOccurs="0">
                <xs:simpleType>
                  <xs:restriction base="xs:decimal">
                    <xs:minInclusive value="0.0" />
                    <xs:maxInclusive value="1.0" />
                  </xs:restriction>
                </xs:simpleType>
              </xs:element>
            </xs:sequence>
          </xs:complexType>
        </xs:element>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>
"#;

pub const SITEMAP_INDEX_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
           targetNamespace="http://www.sitemaps.org/schemas/sitemap/0.9"
           elementFormDefault="qualified">
  <xs:element name="sitemapindex">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="sitemap" maxOccurs="unbounded">
          <xs:complexType>
            <xs:sequence>
              <xs:element name="loc" type="xs:anyURI" />
              <xs:element name="lastmod" type="xs:date" minOccurs="0" />
            </xs:sequence>
          </xs:complexType>
        </xs:element>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>
"#;

/// Which of the two sitemap document types a file should conform to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    UrlSet,
    SitemapIndex,
}

impl SchemaKind {
    pub fn xsd(self) -> &'static str {
        match self {
            SchemaKind::UrlSet => URLSET_XSD,
            SchemaKind::SitemapIndex => SITEMAP_INDEX_XSD,
        }
    }

    /// Root element name of conforming documents
    pub fn root_element(self) -> &'static str {
        match self {
            SchemaKind::UrlSet => "urlset",
            SchemaKind::SitemapIndex => "sitemapindex",
        }
    }

    /// Child record element name under the root
    pub fn record_element(self) -> &'static str {
        match self {
            SchemaKind::UrlSet => "url",
            SchemaKind::SitemapIndex => "sitemap",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.root_element())
    }
}
