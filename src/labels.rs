use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::{Error, Result};

// CORD line-item categories, in class-id order
pub const CORD_LABELS: &[&str] = &[
    "menu.cnt",
    "menu.discountprice",
    "menu.etc",
    "menu.itemsubtotal",
    "menu.nm",
    "menu.num",
    "menu.price",
    "menu.sub_cnt",
    "menu.sub_etc",
    "menu.sub_nm",
    "menu.sub_price",
    "menu.sub_unitprice",
    "menu.unitprice",
    "menu.vatyn",
    "sub_total.discount_price",
    "sub_total.etc",
    "sub_total.othersvc_price",
    "sub_total.service_price",
    "sub_total.subtotal_price",
    "sub_total.tax_price",
    "total.cashprice",
    "total.changeprice",
    "total.creditcardprice",
    "total.emoneyprice",
    "total.menuqty_cnt",
    "total.menutype_cnt",
    "total.total_etc",
    "total.total_price",
    "void_menu.nm",
    "void_menu.price",
];

static TAG_VOCABULARY: OnceLock<TagVocabulary> = OnceLock::new();

/// Get the shared CORD tag vocabulary
pub fn tag_vocabulary() -> &'static TagVocabulary {
    TAG_VOCABULARY.get_or_init(|| TagVocabulary::new(CORD_LABELS))
}

/// A closed label set with stable ids.
#[derive(Debug, Clone)]
pub struct TagVocabulary {
    names: Vec<String>,
    ids: HashMap<String, usize>,
}

impl TagVocabulary {
    pub fn new(names: &[&str]) -> Self {
        let names: Vec<String> = names.iter().map(|name| name.to_string()).collect();
        let ids = names
            .iter()
            .enumerate()
            .map(|(id, name)| (name.clone(), id))
            .collect();
        Self { names, ids }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.ids.contains_key(tag)
    }

    pub fn str2int(&self, tag: &str) -> Result<usize> {
        self.ids
            .get(tag)
            .copied()
            .ok_or_else(|| Error::UnknownTag(tag.to_string()))
    }

    pub fn int2str(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn encode<'a, I>(&self, tags: I) -> Result<Vec<usize>>
    where
        I: IntoIterator<Item = &'a String>,
    {
        tags.into_iter().map(|tag| self.str2int(tag)).collect()
    }
}
