//! Typed filters for the container table and map, and their search-param
//! mapping. Parsing is lenient: anything unknown or malformed resolves to the
//! field's default so a shared URL can never fail to load.

use crate::fetch::ProviderQuery;
use crate::query::{FilterSet, SearchParams};

const PARAM_PAGE_INDEX: &str = "pageIndex";
const PARAM_LOCATION: &str = "location";
const PARAM_CATEGORY: &str = "category";
const PARAM_SORT: &str = "sort";
const PARAM_ORDER: &str = "order";

/// Category of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerCategory {
    General,
    Paper,
    Plastic,
    Metal,
    Glass,
    Organic,
    Hazardous,
}

impl ContainerCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerCategory::General => "general",
            ContainerCategory::Paper => "paper",
            ContainerCategory::Plastic => "plastic",
            ContainerCategory::Metal => "metal",
            ContainerCategory::Glass => "glass",
            ContainerCategory::Organic => "organic",
            ContainerCategory::Hazardous => "hazardous",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "general" => Some(ContainerCategory::General),
            "paper" => Some(ContainerCategory::Paper),
            "plastic" => Some(ContainerCategory::Plastic),
            "metal" => Some(ContainerCategory::Metal),
            "glass" => Some(ContainerCategory::Glass),
            "organic" => Some(ContainerCategory::Organic),
            "hazardous" => Some(ContainerCategory::Hazardous),
            _ => None,
        }
    }
}

/// Sortable fields of a container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContainerSortField {
    Category,
    WayName,
    MunicipalityName,
    #[default]
    CreatedAt,
    ModifiedAt,
}

impl ContainerSortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerSortField::Category => "category",
            ContainerSortField::WayName => "wayName",
            ContainerSortField::MunicipalityName => "municipalityName",
            ContainerSortField::CreatedAt => "createdAt",
            ContainerSortField::ModifiedAt => "modifiedAt",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "category" => Some(ContainerSortField::Category),
            "wayName" => Some(ContainerSortField::WayName),
            "municipalityName" => Some(ContainerSortField::MunicipalityName),
            "createdAt" => Some(ContainerSortField::CreatedAt),
            "modifiedAt" => Some(ContainerSortField::ModifiedAt),
            _ => None,
        }
    }
}

/// Sorting direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Filters of the containers table. Always fully defined so it can always be
/// serialized into a shareable URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerFilters {
    pub page_index: u32,
    /// Free-text location filter. Empty means no filter.
    pub location: String,
    pub category: Option<ContainerCategory>,
    pub sort: ContainerSortField,
    pub order: SortOrder,
}

impl Default for ContainerFilters {
    fn default() -> Self {
        ContainerFilters {
            page_index: 0,
            location: String::new(),
            category: None,
            sort: ContainerSortField::default(),
            order: SortOrder::default(),
        }
    }
}

impl FilterSet for ContainerFilters {
    fn to_search_params(&self) -> SearchParams {
        let mut params = SearchParams::new();
        params.set(PARAM_PAGE_INDEX, self.page_index.to_string());

        if !self.location.is_empty() {
            params.set(PARAM_LOCATION, self.location.clone());
        }
        if let Some(category) = self.category {
            params.set(PARAM_CATEGORY, category.as_str());
        }

        params.set(PARAM_SORT, self.sort.as_str());
        params.set(PARAM_ORDER, self.order.as_str());
        params
    }

    fn from_search_params(params: &SearchParams) -> Self {
        let defaults = ContainerFilters::default();

        let page_index = params
            .get(PARAM_PAGE_INDEX)
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.page_index);

        let location = params
            .get(PARAM_LOCATION)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or(defaults.location);

        let category = params
            .get(PARAM_CATEGORY)
            .and_then(ContainerCategory::parse)
            .or(defaults.category);

        let sort = params
            .get(PARAM_SORT)
            .and_then(ContainerSortField::parse)
            .unwrap_or(defaults.sort);

        let order = params
            .get(PARAM_ORDER)
            .and_then(SortOrder::parse)
            .unwrap_or(defaults.order);

        ContainerFilters {
            page_index,
            location,
            category,
            sort,
            order,
        }
    }
}

impl ProviderQuery for ContainerFilters {
    fn request_params(&self) -> SearchParams {
        let mut params = SearchParams::new();
        params.set("sort", self.sort.as_str());
        params.set("order", self.order.as_str());
        if let Some(category) = self.category {
            params.set("category", category.as_str());
        }
        if !self.location.is_empty() {
            params.set("locationName", self.location.clone());
        }
        params
    }
}
