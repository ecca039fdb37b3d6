//! HTTP handler functions for the crime route API.

use actix_web::{HttpResponse, web};
use crime_route_pipeline::{MapRequest, geocode_notice};
use crime_route_server_models::{
    ApiFilters, ApiHealth, ApiRoute, GeocodeQueryParams, MapQueryParams, RouteQueryParams,
    parse_list,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        incidents: state.dataset.len(),
    })
}

/// `GET /api/filters`
///
/// Returns the values the filter controls offer.
pub async fn filters(state: web::Data<AppState>) -> HttpResponse {
    let dataset = &state.dataset;
    HttpResponse::Ok().json(ApiFilters {
        crime_types: dataset.crime_types().into_iter().map(String::from).collect(),
        case_statuses: dataset.case_statuses().into_iter().map(String::from).collect(),
        date_range: dataset.date_bounds(),
    })
}

/// `GET /api/map`
///
/// Runs the full pipeline for one set of control values.
pub async fn map(state: web::Data<AppState>, params: web::Query<MapQueryParams>) -> HttpResponse {
    let params = params.into_inner();
    let request = MapRequest {
        crime_types: params.crime_types.as_deref().map(parse_list),
        case_statuses: params.statuses.as_deref().map(parse_list),
        from: params.from,
        to: params.to,
        start: params.start.unwrap_or_default(),
        end: params.end.unwrap_or_default(),
    };

    let output = state.pipeline.run(&state.dataset, &request).await;
    HttpResponse::Ok().json(output)
}

/// `GET /api/geocode?q=`
pub async fn geocode(
    state: web::Data<AppState>,
    params: web::Query<GeocodeQueryParams>,
) -> HttpResponse {
    let outcome = state.pipeline.geocoder().resolve(&params.q).await;
    HttpResponse::Ok().json(outcome)
}

/// `GET /api/route?start=&end=`
///
/// Geocodes both locations and resolves a walking route between them.
pub async fn route(
    state: web::Data<AppState>,
    params: web::Query<RouteQueryParams>,
) -> HttpResponse {
    let geocoder = state.pipeline.geocoder();
    let (start, end) = futures::join!(geocoder.resolve(&params.start), geocoder.resolve(&params.end));

    let (route, notice) = match (start.coordinate(), end.coordinate()) {
        (Some(from), Some(to)) => {
            let result = state.pipeline.resolver().find_route(from, to).await;
            let notice = crime_route_map::route_notice(&result);
            (Some(result), notice)
        }
        _ => (
            None,
            geocode_notice(&params.start, &params.end, &start, &end),
        ),
    };

    HttpResponse::Ok().json(ApiRoute {
        distance_label: route
            .as_ref()
            .map(|r| crime_route_map::distance_label(r.distance_km)),
        start,
        end,
        route,
        notice,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, test};
    use async_trait::async_trait;
    use crime_route_dataset::{Dataset, LoadOptions};
    use crime_route_geocoder::GeocoderChain;
    use crime_route_geography_models::BoundingBox;
    use crime_route_map_models::MapSettings;
    use crime_route_pipeline::Pipeline;
    use crime_route_routing::{
        GraphFetchError, RouteResolver, RoutingConfig, StreetGraphProvider, StreetNetwork,
    };
    use serde_json::Value;

    use crate::{AppState, configure};

    const CSV: &str = "\
Crime Type,Date,Location,Latitude,Longitude,Suspect Gender,Suspect Age,Victim Gender,Victim Age,Arrest Made,Case Status,Description
Theft,2023-01-01,T. Nagar,13.0418,80.2341,Male,30,Female,25,No,Open,Phone stolen
Assault,2023-01-02,Guindy,13.0067,80.2206,Male,41,Male,39,Yes,Closed,Fight at bus stop
Theft,2023-01-03,Adyar,13.0012,80.2565,Female,22,Male,60,Yes,Open,Wallet stolen
";

    struct NoNetwork;

    #[async_trait]
    impl StreetGraphProvider for NoNetwork {
        fn name(&self) -> &'static str {
            "none"
        }

        async fn fetch(&self, _area: BoundingBox) -> Result<StreetNetwork, GraphFetchError> {
            Err(GraphFetchError::Parse {
                message: "offline".to_string(),
            })
        }
    }

    fn state() -> actix_web::web::Data<AppState> {
        let dataset = Dataset::from_reader(CSV.as_bytes(), &LoadOptions::default()).unwrap();
        let pipeline = Pipeline::new(
            GeocoderChain::new(Vec::new()),
            RouteResolver::new(Arc::new(NoNetwork), RoutingConfig::default()),
            MapSettings::default(),
        );
        actix_web::web::Data::new(AppState {
            dataset: Arc::new(dataset),
            pipeline: Arc::new(pipeline),
        })
    }

    #[actix_web::test]
    async fn health_reports_incident_count() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["healthy"], true);
        assert_eq!(body["incidents"], 3);
    }

    #[actix_web::test]
    async fn filters_list_distinct_values() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/filters").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["crimeTypes"], serde_json::json!(["Theft", "Assault"]));
        assert_eq!(body["caseStatuses"], serde_json::json!(["Open", "Closed"]));
        assert_eq!(body["dateRange"]["start"], "2023-01-01");
        assert_eq!(body["dateRange"]["end"], "2023-01-03");
    }

    #[actix_web::test]
    async fn map_applies_query_filters() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::get()
            .uri("/api/map?crimeTypes=Theft&from=2023-01-01&to=2023-01-02")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["payload"]["summary"]["total"], 1);
        assert_eq!(body["payload"]["markers"][0]["color"], "warning");
        assert!(body["payload"]["route"].is_null());
        assert_eq!(body["start"]["status"], "blank");
    }

    #[actix_web::test]
    async fn map_with_empty_list_matches_nothing() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/map?statuses=").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["payload"]["summary"]["total"], 0);
    }

    #[actix_web::test]
    async fn map_rejects_bad_dates() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/map?from=yesterday").to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_client_error());
    }

    #[actix_web::test]
    async fn unresolved_route_explains_why() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::get()
            .uri("/api/route?start=Nowhere&end=Elsewhere")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["start"]["status"], "notFound");
        assert!(body["route"].is_null());
        assert_eq!(body["notice"]["level"], "warning");
    }

    #[actix_web::test]
    async fn blank_geocode_makes_no_lookup() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/geocode?q=%20%20").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "blank");
    }
}
