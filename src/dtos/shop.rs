use serde::Deserialize;

use crate::error::AppError;
use crate::store::{Page, ShopQuery, ShopSort};

pub const DEFAULT_SHOP_LIMIT: i64 = 25;

#[derive(Debug, Default, Deserialize)]
pub struct ShopListParams {
    pub province: Option<String>,
    pub region: Option<String>,
    pub district: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ShopListParams {
    pub fn into_query(self) -> Result<ShopQuery, AppError> {
        let sort = match self.sort.as_deref() {
            None | Some("") => ShopSort::default(),
            Some(raw) => ShopSort::parse(raw)
                .ok_or_else(|| AppError::invalid_argument(format!("Cannot sort shops by '{raw}'")))?,
        };
        Ok(ShopQuery {
            province: self.province,
            region: self.region,
            district: self.district,
            sort,
            page: Page::new(self.page, self.limit, DEFAULT_SHOP_LIMIT),
        })
    }
}
