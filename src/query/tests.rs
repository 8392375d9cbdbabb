//! Tests for statement assembly, axis placement and query serialization.

use super::*;
use crate::error::MdxError;
use crate::expression::{LevelExpression, SetExpression};
use crate::types::{ComparisonOperator, Filter, OrderBy, SortDirection};

fn lines(statement: &str) -> Vec<&str> {
    statement.split("\r\n").collect()
}

fn levels(names: &[&str]) -> Vec<LevelExpression> {
    LevelExpression::from_attributes(names).unwrap()
}

// ==================== QueryBuilder ====================

#[test]
fn test_builder_renders_all_clauses() {
    let mut builder = QueryBuilder::new("Sales");
    builder
        .define_set("[s]", &SetExpression::new("[A].[X].children"))
        .define_member("[Measures].[m]", 1, Some("It's"))
        .on_columns(SetExpression::new("[Measures].[m]"))
        .on_rows(SetExpression::new("[s]"))
        .filter_by_query_axis(Some(SetExpression::new("[A].[X].&[1]")))
        .filter_by_slicer_axis(Some(SetExpression::new("[B].[Y].&[2]")));

    let statement = builder.to_statement().unwrap();
    assert_eq!(
        lines(&statement),
        vec![
            "WITH",
            "SET [s] AS [A].[X].children",
            "MEMBER [Measures].[m] AS 1, CAPTION = 'It''s'",
            "SELECT [Measures].[m] DIMENSION PROPERTIES MEMBER_VALUE ON COLUMNS, [s] DIMENSION PROPERTIES MEMBER_VALUE ON ROWS",
            "FROM (SELECT [A].[X].&[1] ON COLUMNS FROM [Sales])",
            "WHERE ([B].[Y].&[2])",
            "CELL PROPERTIES VALUE, FORMATTED_VALUE",
        ]
    );
}

#[test]
fn test_builder_minimal_statement() {
    let mut builder = QueryBuilder::new("Sales");
    builder.on_columns(SetExpression::new("[Measures].[Sales]"));
    assert_eq!(
        lines(&builder.to_statement().unwrap()),
        vec![
            "SELECT [Measures].[Sales] DIMENSION PROPERTIES MEMBER_VALUE ON COLUMNS",
            "FROM [Sales]",
            "CELL PROPERTIES VALUE, FORMATTED_VALUE",
        ]
    );
}

#[test]
fn test_builder_requires_columns() {
    let mut builder = QueryBuilder::new("Sales");
    builder.on_rows(SetExpression::new("[A].[X].children"));
    assert!(matches!(builder.to_statement(), Err(MdxError::InvalidQuery(_))));
}

#[test]
fn test_builder_rejects_page_axis() {
    let mut builder = QueryBuilder::new("Sales");
    let err = builder.on_pages(SetExpression::new("x")).unwrap_err();
    assert!(matches!(err, MdxError::UnsupportedAxis(_)));
}

// ==================== ExpressionFactory ====================

#[test]
fn test_factory_splits_query_and_slicer_filters() {
    let options = QueryOptions::new()
        .filter(Filter::new("[A].[X]").members([1i64, 2]))
        .filter(Filter::new("[D].[Y]").compare(ComparisonOperator::GreaterThan, Some(5i64.into())));
    let factory = ExpressionFactory::new(&levels(&["[A].[X]"]), &options).unwrap();

    assert_eq!(
        factory.query_axis().unwrap().unwrap().text(),
        "{[A].[X].&[1],[A].[X].&[2]}"
    );
    assert_eq!(
        factory.slicer_axis().unwrap().unwrap().text(),
        "FILTER([D].[Y].children,[D].[Y].MEMBER_VALUE > 5)"
    );
}

#[test]
fn test_factory_skips_filters_without_condition() {
    let options = QueryOptions::new().filter(Filter::new("[A].[X]").include_all());
    let factory = ExpressionFactory::new(&levels(&["[A].[X]"]), &options).unwrap();
    assert!(factory.query_axis().unwrap().is_none());
    assert!(factory.slicer_axis().unwrap().is_none());
    assert_eq!(
        factory.create_set_from_attribute(&LevelExpression::new("[A].[X]")).text(),
        "[A].[X].members"
    );
}

#[test]
fn test_factory_combines_several_filters() {
    let options = QueryOptions::new()
        .filter(Filter::new("[A].[X]").members(["a"]))
        .filter(Filter::new("[B].[Y]").include_all().compare(ComparisonOperator::NotEqual, None));
    let factory = ExpressionFactory::new(&levels(&["[A].[X]", "[B].[Y]"]), &options).unwrap();
    assert_eq!(
        factory.query_axis().unwrap().unwrap().text(),
        "CROSSJOIN([A].[X].&[a],FILTER([B].[Y].members,[B].[Y].MEMBER_VALUE <> NULL))"
    );
}

#[test]
fn test_factory_rejects_duplicates() {
    let options = QueryOptions::new()
        .filter(Filter::new("[A].[X]"))
        .filter(Filter::new("[A].[X]"));
    let err = ExpressionFactory::new(&[], &options).unwrap_err();
    assert!(matches!(err, MdxError::InvalidFilter(_)));

    let repeated = [LevelExpression::new("[A].[X]"), LevelExpression::new("[A].[X]")];
    let err = ExpressionFactory::new(&repeated, &QueryOptions::new()).unwrap_err();
    assert!(matches!(err, MdxError::InvalidAttribute(_)));
}

#[test]
fn test_factory_total_count_set() {
    let options = QueryOptions::new().filter(Filter::new("[B].[Y]").include_total_count());
    let factory = ExpressionFactory::new(&levels(&["[A].[X]", "[B].[Y]"]), &options).unwrap();
    assert!(factory.has_total_count());
    assert_eq!(factory.total_count_set().unwrap().unwrap().text(), "[B].[Y].children");

    let factory = ExpressionFactory::new(&levels(&["[A].[X]"]), &QueryOptions::new()).unwrap();
    assert!(factory.total_count_set().unwrap().is_none());
}

#[test]
fn test_sort_options_without_inclusive_levels() {
    let factory = ExpressionFactory::new(&levels(&["[A].[X]", "[B].[Y]"]), &QueryOptions::new()).unwrap();
    let set = factory
        .create_set_from_sort_options(&levels(&["[A].[X]", "[B].[Y]"]), &QueryOptions::new())
        .unwrap();
    assert_eq!(set.text(), "CROSSJOIN([A].[X].children,[B].[Y].children)");
}

#[test]
fn test_sort_options_keep_outer_attributes_pending() {
    let attributes = levels(&["[A].[X]", "[B].[Y]"]);
    let options = QueryOptions::new().order_by(OrderBy::new("[B].[Y]"));
    let factory = ExpressionFactory::new(&attributes, &options).unwrap();
    let set = factory.create_set_from_sort_options(&attributes, &options).unwrap();
    assert_eq!(
        set.text(),
        "CROSSJOIN([A].[X].children,ORDER([B].[Y].children,[B].[Y].MEMBER_VALUE))"
    );
}

#[test]
fn test_sort_options_include_outer_ordered_attribute() {
    let attributes = levels(&["[A].[X]", "[B].[Y]"]);
    let options = QueryOptions::new().order_by(OrderBy::asc("[A].[X]"));
    let factory = ExpressionFactory::new(&attributes, &options).unwrap();
    let set = factory.create_set_from_sort_options(&attributes, &options).unwrap();
    assert_eq!(
        set.text(),
        "ORDER(CROSSJOIN([A].[X].children,[B].[Y].children),[A].[X].MEMBER_VALUE,ASC)"
    );
}

#[test]
fn test_sort_options_measure_only_sorts_innermost() {
    let attributes = levels(&["[A].[X]", "[B].[Y]"]);
    let options = QueryOptions::new()
        .order_by(OrderBy::new("[Measures].[Sales]").direction(SortDirection::Bdesc))
        .top(10);
    let factory = ExpressionFactory::new(&attributes, &options).unwrap();
    let set = factory.create_set_from_sort_options(&attributes, &options).unwrap();
    assert_eq!(
        set.text(),
        "CROSSJOIN([A].[X].children,HEAD(ORDER([B].[Y].children,[Measures].[Sales],BDESC),10))"
    );
}

#[test]
fn test_sort_options_extract_foreign_levels() {
    let attributes = levels(&["[A].[X]"]);
    let options = QueryOptions::new().order_by(OrderBy::desc("[C].[Z]"));
    let factory = ExpressionFactory::new(&attributes, &options).unwrap();
    let set = factory.create_set_from_sort_options(&attributes, &options).unwrap();
    assert_eq!(
        set.text(),
        "EXTRACT(ORDER(CROSSJOIN([A].[X].children,[C].[Z].children),[C].[Z].MEMBER_VALUE,DESC),[A].[X])"
    );
}

#[test]
fn test_sort_options_setup_runs_before_ordering() {
    let attributes = levels(&["[A].[X]"]);
    let options = QueryOptions::new().order_by(OrderBy::desc("[A].[X]"));
    let factory = ExpressionFactory::new(&attributes, &options).unwrap();
    let set = factory
        .create_set_from_sort_options_with(&attributes, &options, |s| s.non_empty(None))
        .unwrap();
    assert_eq!(
        set.text(),
        "ORDER(NONEMPTY([A].[X].children),[A].[X].MEMBER_VALUE,DESC)"
    );
}

#[test]
fn test_sort_options_require_attributes() {
    let options = QueryOptions::new().order_by(OrderBy::new("[Measures].[Sales]"));
    let factory = ExpressionFactory::new(&[], &options).unwrap();
    assert!(factory.create_set_from_sort_options(&[], &options).is_err());
}

#[test]
fn test_paging() {
    let factory = ExpressionFactory::new(&[], &QueryOptions::new()).unwrap();
    let set = SetExpression::new("s");

    let options = QueryOptions::new().skip(2);
    assert_eq!(
        factory.extend_set_with_sort_options(&set, &options).text(),
        "SUBSET(s,2,COUNT(s))"
    );

    let options = QueryOptions::new().skip(2).top(5);
    assert_eq!(factory.extend_set_with_sort_options(&set, &options).text(), "SUBSET(s,2,5)");

    let options = QueryOptions::new().top(3);
    assert_eq!(factory.extend_set_with_sort_options(&set, &options).text(), "HEAD(s,3)");

    assert_eq!(
        factory.extend_set_with_sort_options(&set, &QueryOptions::new()),
        set
    );
}

#[test]
fn test_ordering_applies_last_key_innermost() {
    let factory = ExpressionFactory::new(&[], &QueryOptions::new()).unwrap();
    let options = QueryOptions::new()
        .order_by(OrderBy::asc("[A].[X]"))
        .order_by(OrderBy { level_expression: None, sort_direction: None })
        .order_by(OrderBy::desc("[Measures].[Sales]"));
    assert_eq!(
        factory
            .extend_set_with_sort_options(&SetExpression::new("s"), &options)
            .text(),
        "ORDER(ORDER(s,[Measures].[Sales],DESC),[A].[X].MEMBER_VALUE,ASC)"
    );
}

// ==================== Dimension queries ====================

#[test]
fn test_dimension_query_without_measures() {
    let query = DimensionQuery {
        attributes: vec!["[Geo].[Country]".into()],
        ..Default::default()
    };
    let statement = QuerySerializer::new("Sales")
        .serialize_dimension_query(&query)
        .unwrap();
    assert_eq!(
        lines(&statement),
        vec![
            "WITH",
            "SET [queryAttributes] AS [Geo].[Country].children",
            "MEMBER [Measures].[_isNonEmpty] AS 1, CAPTION = 'Is Non-Empty'",
            "SELECT [Measures].[_isNonEmpty] DIMENSION PROPERTIES MEMBER_VALUE ON COLUMNS, [queryAttributes] DIMENSION PROPERTIES MEMBER_VALUE ON ROWS",
            "FROM [Sales]",
            "CELL PROPERTIES VALUE, FORMATTED_VALUE",
        ]
    );
}

#[test]
fn test_dimension_query_include_all_uses_members() {
    let query = DimensionQuery {
        attributes: vec!["[Geo].[Country]".into()],
        options: QueryOptions::new().filter(Filter::new("[Geo].[Country]").include_all()),
        ..Default::default()
    };
    let statement = QuerySerializer::new("Sales")
        .serialize_dimension_query(&query)
        .unwrap();
    assert!(statement.contains("SET [queryAttributes] AS [Geo].[Country].members"));
}

#[test]
fn test_dimension_query_non_empty_with_measures() {
    let query = DimensionQuery {
        attributes: vec!["[Geo].[Country]".into()],
        measures: vec!["[Measures].[Sales]".into()],
        query_type: Some(DimensionQueryType::NonEmpty),
        ..Default::default()
    };
    let statement = QuerySerializer::new("Sales")
        .serialize_dimension_query(&query)
        .unwrap();
    let lines = lines(&statement);
    assert_eq!(lines[2], "SET [queryMeasures] AS [Measures].[Sales]");
    assert_eq!(
        lines[3],
        "MEMBER [Measures].[_isNonEmpty] AS IIF(COUNT([queryMeasures],EXCLUDEEMPTY) = 0,0,1), CAPTION = 'Is Non-Empty'"
    );
    assert!(lines[4].contains(
        "EXTRACT(FILTER(CROSSJOIN([queryAttributes],[queryMeasures]),[Measures].[_isNonEmpty] = 1),[Geo].[Country]) DIMENSION PROPERTIES MEMBER_VALUE ON ROWS"
    ));
}

#[test]
fn test_dimension_query_empty_type() {
    let query = DimensionQuery {
        attributes: vec!["[Geo].[Country]".into()],
        measures: vec!["[Measures].[Sales]".into()],
        query_type: Some(DimensionQueryType::Empty),
        ..Default::default()
    };
    let statement = QuerySerializer::new("Sales")
        .serialize_dimension_query(&query)
        .unwrap();
    assert!(statement.contains("[Measures].[_isNonEmpty] = 0"));
}

#[test]
fn test_dimension_query_order_by_extends_and_extracts() {
    let query = DimensionQuery {
        attributes: vec!["[Geo].[City]".into()],
        options: QueryOptions::new().order_by(OrderBy::desc("[Geo].[Population]")).top(5),
        ..Default::default()
    };
    let statement = QuerySerializer::new("Sales")
        .serialize_dimension_query(&query)
        .unwrap();
    assert!(statement
        .contains("SET [queryAttributes] AS CROSSJOIN([Geo].[City].children,[Geo].[Population].children)"));
    assert!(statement.contains(
        "EXTRACT(HEAD(ORDER([queryAttributes],[Geo].[Population].MEMBER_VALUE,DESC),5),[Geo].[City]) DIMENSION PROPERTIES MEMBER_VALUE ON ROWS"
    ));
}

#[test]
fn test_dimension_query_total_count() {
    let query = DimensionQuery {
        attributes: vec!["[Geo].[Country]".into()],
        options: QueryOptions::new().skip(10).top(10).with_total_count(),
        ..Default::default()
    };
    let statement = QuerySerializer::new("Sales")
        .serialize_dimension_query(&query)
        .unwrap();
    assert!(statement
        .contains("MEMBER [Measures].[_totalCount] AS COUNT([queryAttributes]), CAPTION = 'Total Count'"));
    assert!(statement.contains(
        "SELECT UNION([Measures].[_isNonEmpty],[Measures].[_totalCount]) DIMENSION PROPERTIES MEMBER_VALUE ON COLUMNS, SUBSET([queryAttributes],10,10)"
    ));
}

#[test]
fn test_dimension_query_filter_placement() {
    let query = DimensionQuery {
        attributes: vec!["[Geo].[Country]".into()],
        options: QueryOptions::new()
            .filter(Filter::new("[Geo].[Country]").members(["US", "CA"]))
            .filter(Filter::new("[Date].[Year]").members([2019i64])),
        ..Default::default()
    };
    let statement = QuerySerializer::new("Sales")
        .serialize_dimension_query(&query)
        .unwrap();
    assert!(statement.contains(
        "FROM (SELECT {[Geo].[Country].&[US],[Geo].[Country].&[CA]} ON COLUMNS FROM [Sales])"
    ));
    assert!(statement.contains("WHERE ([Date].[Year].&[2019])"));
}

#[test]
fn test_dimension_query_validation() {
    let serializer = QuerySerializer::new("Sales");

    let empty = DimensionQuery::default();
    assert!(matches!(
        serializer.serialize_dimension_query(&empty),
        Err(MdxError::InvalidQuery(_))
    ));

    let measure_as_attribute = DimensionQuery {
        attributes: vec!["[Measures].[Sales]".into()],
        ..Default::default()
    };
    assert!(matches!(
        serializer.serialize_dimension_query(&measure_as_attribute),
        Err(MdxError::InvalidAttribute(_))
    ));

    let reserved = DimensionQuery {
        attributes: vec![ATTRIBUTES_SET.into()],
        ..Default::default()
    };
    assert!(serializer.serialize_dimension_query(&reserved).is_err());
}

// ==================== Table queries ====================

#[test]
fn test_table_query_rows_with_sort_and_slicer() {
    let query = TableQuery {
        measures: vec!["[Measures].[Sales]".into()],
        rows: vec!["[Geo].[Country]".into()],
        options: QueryOptions::new()
            .filter(Filter::new("[Date].[Year]").members([2019i64]))
            .order_by(OrderBy::desc("[Measures].[Sales]"))
            .top(10),
        ..Default::default()
    };
    let statement = QuerySerializer::new("Sales").serialize_table_query(&query).unwrap();
    assert_eq!(
        lines(&statement),
        vec![
            "WITH",
            "SET [queryMeasures] AS [Measures].[Sales]",
            "SET [queryRows] AS HEAD(ORDER(NONEMPTY([Geo].[Country].children,[queryMeasures]),[Measures].[Sales],DESC),10)",
            "SELECT [queryMeasures] DIMENSION PROPERTIES MEMBER_VALUE ON COLUMNS, [queryRows] DIMENSION PROPERTIES MEMBER_VALUE ON ROWS",
            "FROM [Sales]",
            "WHERE ([Date].[Year].&[2019])",
            "CELL PROPERTIES VALUE, FORMATTED_VALUE",
        ]
    );
}

#[test]
fn test_table_query_columns_and_measures() {
    let query = TableQuery {
        columns: vec!["[Date].[Year]".into()],
        measures: vec!["[Measures].[Sales]".into(), "[Measures].[Cost]".into()],
        rows: vec!["[Geo].[Country]".into()],
        ..Default::default()
    };
    let statement = QuerySerializer::new("Sales").serialize_table_query(&query).unwrap();
    let lines = lines(&statement);
    assert_eq!(lines[1], "SET [queryMeasures] AS {[Measures].[Sales],[Measures].[Cost]}");
    assert_eq!(
        lines[2],
        "SET [queryColumns] AS NONEMPTY([Date].[Year].children,[queryMeasures])"
    );
    assert_eq!(
        lines[3],
        "SET [queryRows] AS NONEMPTY([Geo].[Country].children,[queryMeasures])"
    );
    assert!(lines[4].starts_with(
        "SELECT CROSSJOIN([queryColumns],[queryMeasures]) DIMENSION PROPERTIES MEMBER_VALUE ON COLUMNS"
    ));
}

#[test]
fn test_table_query_without_rows_pages_columns() {
    let query = TableQuery {
        columns: vec!["[Date].[Year]".into()],
        options: QueryOptions::new().skip(1).top(2),
        ..Default::default()
    };
    let statement = QuerySerializer::new("Sales").serialize_table_query(&query).unwrap();
    assert!(statement.contains("SET [queryColumns] AS [Date].[Year].children"));
    assert!(statement.contains(
        "SELECT SUBSET([queryColumns],1,2) DIMENSION PROPERTIES MEMBER_VALUE ON COLUMNS\r\nFROM [Sales]"
    ));
}

#[test]
fn test_table_query_total_count() {
    let query = TableQuery {
        measures: vec!["[Measures].[Sales]".into()],
        rows: vec!["[Geo].[Country]".into()],
        options: QueryOptions::new()
            .filter(Filter::new("[Geo].[Country]").include_total_count())
            .top(5),
        ..Default::default()
    };
    let statement = QuerySerializer::new("Sales").serialize_table_query(&query).unwrap();
    assert!(statement.contains(
        "MEMBER [Measures].[_totalCount] AS COUNT(NONEMPTY([Geo].[Country].children,[queryMeasures])), CAPTION = 'Total Count'"
    ));
    assert!(statement.contains("SELECT UNION([queryMeasures],[Measures].[_totalCount])"));
}

#[test]
fn test_table_query_validation() {
    let serializer = QuerySerializer::new("Sales");
    let rows_only = TableQuery {
        rows: vec!["[Geo].[Country]".into()],
        ..Default::default()
    };
    assert!(matches!(
        serializer.serialize_table_query(&rows_only),
        Err(MdxError::InvalidQuery(_))
    ));

    let bad_measure = TableQuery {
        measures: vec!["[Geo].[Country]".into()],
        ..Default::default()
    };
    assert!(matches!(
        serializer.serialize_table_query(&bad_measure),
        Err(MdxError::InvalidMeasure(_))
    ));

    let measures_total = TableQuery {
        measures: vec!["[Measures].[Sales]".into()],
        options: QueryOptions::new().with_total_count(),
        ..Default::default()
    };
    assert!(serializer.serialize_table_query(&measures_total).is_err());
}

// ==================== Models ====================

#[test]
fn test_query_json_shape() {
    let query: DimensionQuery = serde_json::from_value(serde_json::json!({
        "attributes": ["[Geo].[Country]"],
        "measures": ["[Measures].[Sales]"],
        "type": "nonEmpty",
        "orderBy": [{ "levelExpression": "[Geo].[Country]", "sortDirection": "ASC" }],
        "skip": 5,
        "includeTotalCount": true
    }))
    .unwrap();
    assert_eq!(query.query_type, Some(DimensionQueryType::NonEmpty));
    assert_eq!(query.options.skip, Some(5));
    assert_eq!(query.options.order_by[0].sort_direction, Some(SortDirection::Asc));
    assert!(query.options.requests_total_count());

    assert!(serde_json::from_value::<DimensionQuery>(serde_json::json!({
        "attributes": ["[Geo].[Country]"],
        "type": "sometimes"
    }))
    .is_err());
    assert!("sometimes".parse::<DimensionQueryType>().is_err());
    assert_eq!("empty".parse::<DimensionQueryType>().unwrap(), DimensionQueryType::Empty);
}
