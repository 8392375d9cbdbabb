//! `Mdx` facade: compile, post through a transport, materialize.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::MdxResult;
use crate::query::{DimensionOptions, QueryOptions, QuerySerializer, TableQuery};
use crate::response::Response;
use crate::result::{
    chart_data, dimension_rows, table_rows, AttributeData, Chart, ChartConfig, DimensionRowResult,
    ExpressionMap, TableRowResult, VirtualRow, VirtualRowBuilder, VirtualTable,
};
use crate::transport::Transport;
use crate::types::Filter;

const MEASURES_PREFIX: &str = "[Measures]";

/// Queries one cube through a [`Transport`].
pub struct Mdx<T> {
    serializer: QuerySerializer,
    transport: T,
}

impl<T: Transport> Mdx<T> {
    pub fn new(cube: impl Into<String>, transport: T) -> Self {
        Self {
            serializer: QuerySerializer::new(cube),
            transport,
        }
    }

    pub fn cube(&self) -> &str {
        self.serializer.cube()
    }

    pub fn serializer(&self) -> &QuerySerializer {
        &self.serializer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn get_dimension_data(
        &self,
        attributes: Vec<String>,
        options: DimensionOptions,
    ) -> MdxResult<DimensionRowResult<AttributeData>> {
        let query = options.into_query(attributes);
        let include_total_count = query.options.requests_total_count();
        let statement = self.serializer.serialize_dimension_query(&query)?;
        let response = self.post(&statement).await?;
        dimension_rows(&response, include_total_count)
    }

    /// Like [`Mdx::get_dimension_data`], with rows deserialized into `D`.
    pub async fn get_dimension_dtos<D: DeserializeOwned>(
        &self,
        map: &ExpressionMap,
        options: DimensionOptions,
    ) -> MdxResult<DimensionRowResult<D>> {
        let attributes = map.expressions().map(str::to_string).collect();
        let result = self.get_dimension_data(attributes, options).await?;
        result.try_map(|data| map.to_dto(&data))
    }

    pub async fn get_table_row_data(
        &self,
        measures: Vec<String>,
        rows: Vec<String>,
        options: QueryOptions,
    ) -> MdxResult<TableRowResult<AttributeData>> {
        let include_totals = options.requests_totals();
        let include_total_count = options.requests_total_count();
        let response = self
            .post_table_query(TableQuery {
                columns: Vec::new(),
                measures,
                rows,
                options,
            })
            .await?;
        table_rows(&response, include_totals, include_total_count)
    }

    /// Map entries under `[Measures]` become measures, the rest rows.
    pub async fn get_table_row_dtos<D: DeserializeOwned>(
        &self,
        map: &ExpressionMap,
        options: QueryOptions,
    ) -> MdxResult<TableRowResult<D>> {
        let (measures, rows): (Vec<String>, Vec<String>) = map
            .expressions()
            .map(str::to_string)
            .partition(|e| e.starts_with(MEASURES_PREFIX));
        let result = self.get_table_row_data(measures, rows, options).await?;
        result.try_map(|data| map.to_dto(&data))
    }

    pub async fn get_chart_data(&self, config: &ChartConfig, options: QueryOptions) -> MdxResult<Chart> {
        let response = self
            .post_table_query(TableQuery {
                columns: Vec::new(),
                measures: config.measures.clone(),
                rows: config.rows(),
                options,
            })
            .await?;
        chart_data(&response)
    }

    pub fn virtual_table<C, E>(&self) -> VirtualTableBuilder<'_, T, C, E> {
        VirtualTableBuilder {
            mdx: self,
            table: VirtualTable::new(),
        }
    }

    async fn post_table_query(&self, query: TableQuery) -> MdxResult<Response> {
        let statement = self.serializer.serialize_table_query(&query)?;
        self.post(&statement).await
    }

    async fn post(&self, statement: &str) -> MdxResult<Response> {
        debug!(cube = %self.cube(), "Posting statement");
        match self.transport.post(statement).await {
            Ok(response) => {
                debug!(cube = %self.cube(), "Received {}", response.counts());
                Ok(response)
            }
            Err(err) => {
                warn!(cube = %self.cube(), "Statement failed: {}", err);
                Err(err)
            }
        }
    }
}

/// Collects virtual rows, then posts one measures-only table query.
pub struct VirtualTableBuilder<'m, T, C, E> {
    mdx: &'m Mdx<T>,
    table: VirtualTable<C, E>,
}

impl<'m, T: Transport, C, E> VirtualTableBuilder<'m, T, C, E> {
    pub fn add_virtual_row(
        mut self,
        setup: impl FnOnce(VirtualRowBuilder<C, E>) -> VirtualRowBuilder<C, E>,
        extended_properties: Option<E>,
    ) -> Self {
        self.table = self.table.add_virtual_row(setup, extended_properties);
        self
    }

    pub fn measures(&self) -> Vec<String> {
        self.table.measures()
    }

    pub async fn post(&self, filters: Vec<Filter>) -> MdxResult<Vec<VirtualRow<C, E>>>
    where
        C: Clone,
        E: Clone,
    {
        let response = self
            .mdx
            .post_table_query(TableQuery {
                measures: self.table.measures(),
                options: QueryOptions {
                    filters,
                    ..Default::default()
                },
                ..Default::default()
            })
            .await?;
        self.table.materialize(&response)
    }
}
