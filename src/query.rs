use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Data source an observation originates from.
///
/// The service identifies providers by fixed numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Artportalen,
    ClamGateway,
    Kul,
    Mvm,
}

impl Provider {
    /// Numeric provider code used on the wire.
    pub fn code(self) -> u32 {
        match self {
            Provider::Artportalen => 1,
            Provider::ClamGateway => 2,
            Provider::Kul => 3,
            Provider::Mvm => 4,
        }
    }
}

/// Kind of named geographic area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AreaType {
    Province,
    Municipality,
}

impl AreaType {
    pub fn as_str(self) -> &'static str {
        match self {
            AreaType::Province => "Province",
            AreaType::Municipality => "Municipality",
        }
    }
}

/// How the date range is matched against observation event dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum DateFilterType {
    /// Match observations whose event dates overlap the given range.
    #[default]
    OverlappingStartDateAndEndDate,
}

/// A search filter for the `/Observations` endpoints.
///
/// Field names and nesting of the serialized form are part of the service's
/// wire contract. Filter categories only appear in the JSON once something
/// has been written to them; `dataProvider` and `date` are always present.
///
/// Built via [`Query::builder`]; a query cannot exist without a bounding
/// date range.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    data_provider: IdList,
    #[serde(skip_serializing_if = "Option::is_none")]
    geographics: Option<Geographics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    taxon: Option<IdList>,
    date: DateFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<Output>,
}

#[derive(Debug, Clone, Default, Serialize)]
struct IdList {
    ids: Vec<u32>,
}

#[derive(Debug, Clone, Default, Serialize)]
struct Geographics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    areas: Vec<Area>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    geometries: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Area {
    area_type: AreaType,
    feature_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct DateFilter {
    start_date: String,
    end_date: String,
    date_filter_type: DateFilterType,
}

impl DateFilter {
    fn new(start: NaiveDate, end: NaiveDate, filter_type: DateFilterType) -> Self {
        Self {
            start_date: start.format("%Y-%m-%d").to_string(),
            end_date: end.format("%Y-%m-%d").to_string(),
            date_filter_type: filter_type,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Output {
    fields: Vec<String>,
}

impl Query {
    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }

    /// Appends one named-area filter.
    pub fn add_area(&mut self, area_type: AreaType, feature_id: impl Into<String>) {
        self.geographics
            .get_or_insert_with(Geographics::default)
            .areas
            .push(Area {
                area_type,
                feature_id: feature_id.into(),
            });
    }

    /// Appends geometry filters, passed through to the service verbatim.
    pub fn add_geometry_filters(&mut self, geometries: Vec<Value>) {
        self.geographics
            .get_or_insert_with(Geographics::default)
            .geometries
            .extend(geometries);
    }

    /// Appends taxon ids to the filter. Ids accumulate across calls and are
    /// not deduplicated.
    pub fn add_taxons(&mut self, taxon_ids: &[u32]) {
        self.taxon
            .get_or_insert_with(IdList::default)
            .ids
            .extend_from_slice(taxon_ids);
    }

    /// Replaces the date filter. Unlike the list-valued filters this is a
    /// wholesale replacement, not an append.
    pub fn add_date_filter(
        &mut self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        filter_type: DateFilterType,
    ) {
        self.date = DateFilter::new(start_date, end_date, filter_type);
    }

    /// Replaces the set of field paths the service should include in results.
    pub fn set_output_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output = Some(Output {
            fields: fields.into_iter().map(Into::into).collect(),
        });
    }

    /// Currently requested output field paths, if any have been set.
    pub fn output_fields(&self) -> Option<&[String]> {
        self.output.as_ref().map(|o| o.fields.as_slice())
    }
}

/// Builder for [`Query`].
///
/// All setters take owned values and return `self`, so a query is assembled
/// in one expression. `build` fails unless both dates were supplied.
#[derive(Debug, Default)]
pub struct QueryBuilder {
    providers: Option<Vec<Provider>>,
    provinces: Vec<String>,
    municipalities: Vec<String>,
    taxons: Vec<u32>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    geometries: Vec<Value>,
}

impl QueryBuilder {
    /// Sets the data providers to search.
    ///
    /// When this is never called the query defaults to [`Provider::Artportalen`].
    /// An explicitly empty list is kept as-is and yields an empty `ids` array.
    pub fn providers(mut self, providers: Vec<Provider>) -> Self {
        self.providers = Some(providers);
        self
    }

    /// Province feature ids, as returned by the area lookup.
    pub fn provinces(mut self, feature_ids: Vec<String>) -> Self {
        self.provinces = feature_ids;
        self
    }

    /// Municipality feature ids, as returned by the area lookup.
    pub fn municipalities(mut self, feature_ids: Vec<String>) -> Self {
        self.municipalities = feature_ids;
        self
    }

    pub fn taxons(mut self, taxon_ids: Vec<u32>) -> Self {
        self.taxons = taxon_ids;
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    /// Geometry filter objects, passed through to the service verbatim.
    pub fn geometries(mut self, geometries: Vec<Value>) -> Self {
        self.geometries = geometries;
        self
    }

    pub fn build(self) -> Result<Query> {
        let (Some(start), Some(end)) = (self.start_date, self.end_date) else {
            return Err(Error::MissingDateRange);
        };

        let providers = self
            .providers
            .unwrap_or_else(|| vec![Provider::Artportalen]);

        let mut query = Query {
            data_provider: IdList {
                ids: providers.iter().map(|p| p.code()).collect(),
            },
            geographics: None,
            taxon: None,
            date: DateFilter::new(start, end, DateFilterType::default()),
            output: None,
        };

        for feature_id in self.provinces {
            query.add_area(AreaType::Province, feature_id);
        }
        for feature_id in self.municipalities {
            query.add_area(AreaType::Municipality, feature_id);
        }
        if !self.geometries.is_empty() {
            query.add_geometry_filters(self.geometries);
        }
        if !self.taxons.is_empty() {
            query.add_taxons(&self.taxons);
        }

        Ok(query)
    }
}
