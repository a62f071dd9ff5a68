use std::collections::HashMap;

use actix_cors::Cors;
use actix_web::{get, post, put, web, App, HttpRequest, HttpResponse, HttpServer};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{bson::doc, bson::oid::ObjectId, Client};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use beanywhere::auth::resolve_current_user;
use beanywhere::errors::SplitError;
use beanywhere::ledger::{validate_item, StoreSession};
use beanywhere::schemas::{FoodItem, FoodStore, FoodTrip, UserId, UserRef};
use beanywhere::split::{format_currency, grand_total, totals_by_user};

#[derive(Deserialize, Serialize)]
struct TripFormJson {
    name: String,
    location: String,
    #[serde(default)]
    members: Vec<UserRef>,
}

#[derive(Deserialize, Serialize)]
struct StoreFormJson {
    name: String,
    address: String,
    items: Vec<FoodItem>,
}

#[derive(Serialize)]
struct UserTotalJson {
    name: String,
    amount: f64,
    formatted: String,
}

#[derive(Serialize)]
struct StoreTotalsJson {
    grand_total: f64,
    grand_total_formatted: String,
    user_totals: HashMap<UserId, UserTotalJson>,
}

#[put("/trips/{id}")]
async fn add_trip(
    client: web::Data<Client>,
    id: web::Path<String>,
    json: web::Json<TripFormJson>,
) -> HttpResponse {
    let trips = client.database("BeAnywhere").collection("Trips");
    let form = json.into_inner();
    let trip = FoodTrip {
        id: id.into_inner(),
        name: form.name,
        location: form.location,
        members: form.members,
        date_created: Utc::now(),
    };
    match trips.insert_one(trip, None).await {
        Ok(_) => HttpResponse::Ok().body("Trip added"),
        Err(err) => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

#[post("/trips/{id}/members")]
async fn add_member(
    client: web::Data<Client>,
    id: web::Path<String>,
    json: web::Json<UserRef>,
) -> HttpResponse {
    let trips = client.database("BeAnywhere").collection::<FoodTrip>("Trips");
    let member = json.into_inner();
    // The filter keeps the member list free of duplicate user ids
    match trips
        .update_one(
            doc! { "id": id.into_inner(), "members.id": { "$ne": member.id.clone() } },
            doc! { "$push": { "members": bson::to_bson(&member).unwrap() } },
            None,
        )
        .await
    {
        Ok(_) => HttpResponse::Ok().body("Member added"),
        Err(err) => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

#[put("/trips/{trip_id}/stores/{store_id}")]
async fn add_store(
    client: web::Data<Client>,
    path: web::Path<(String, String)>,
    request: HttpRequest,
    json: web::Json<StoreFormJson>,
) -> HttpResponse {
    let (trip_id, store_id) = path.into_inner();
    let Some(submitter) = resolve_current_user(&request) else {
        return HttpResponse::Unauthorized().body(SplitError::MissingSubmitter.to_string());
    };

    let form = json.into_inner();
    let mut session = StoreSession::with_submitter(submitter);
    for item in form.items {
        if let Err(err) = session.add_item(item) {
            return HttpResponse::BadRequest().body(err.to_string());
        }
    }
    let mut store = match session.finalize(&trip_id, &store_id, &form.name, &form.address, Utc::now())
    {
        Ok(store) => store,
        Err(err) => return HttpResponse::BadRequest().body(err.to_string()),
    };
    for debtor in &mut store.debtors {
        debtor.id = ObjectId::new().to_hex();
    }

    let stores = client.database("BeAnywhere").collection("Stores");
    match stores.insert_one(store, None).await {
        Ok(_) => HttpResponse::Ok().body("Store added"),
        Err(err) => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

#[get("/trips/{trip_id}/stores")]
async fn list_stores(client: web::Data<Client>, trip_id: web::Path<String>) -> HttpResponse {
    let stores = client.database("BeAnywhere").collection::<FoodStore>("Stores");
    let cursor = match stores
        .find(doc! { "trip_id": trip_id.into_inner() }, None)
        .await
    {
        Ok(cursor) => cursor,
        Err(err) => return HttpResponse::InternalServerError().body(err.to_string()),
    };
    match cursor.try_collect::<Vec<FoodStore>>().await {
        Ok(stores) => HttpResponse::Ok().json(stores),
        Err(err) => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

#[post("/trips/{trip_id}/stores/{store_id}/items")]
async fn add_item(
    client: web::Data<Client>,
    path: web::Path<(String, String)>,
    json: web::Json<FoodItem>,
) -> HttpResponse {
    let (trip_id, store_id) = path.into_inner();
    let item = json.into_inner();
    if let Err(err) = validate_item(&item) {
        return HttpResponse::BadRequest().body(err.to_string());
    }
    let stores = client.database("BeAnywhere").collection::<FoodStore>("Stores");
    match stores
        .update_one(
            doc! { "id": store_id, "trip_id": trip_id },
            doc! { "$push": { "items": bson::to_bson(&item).unwrap() } },
            None,
        )
        .await
    {
        Ok(result) if result.matched_count == 0 => {
            HttpResponse::NotFound().body("Couldn't find the desired store")
        }
        Ok(_) => HttpResponse::Ok().body("Item added"),
        Err(err) => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

// Payer re-selection: replaces an item's payer set after the fact
#[put("/trips/{trip_id}/stores/{store_id}/items/{item_id}/payers")]
async fn update_item_payers(
    client: web::Data<Client>,
    path: web::Path<(String, String, String)>,
    json: web::Json<Vec<UserRef>>,
) -> HttpResponse {
    let (trip_id, store_id, item_id) = path.into_inner();
    let payers = json.into_inner();
    if payers.is_empty() {
        return HttpResponse::BadRequest().body("An item needs at least one payer");
    }
    let stores = client.database("BeAnywhere").collection::<FoodStore>("Stores");
    match stores
        .update_one(
            doc! { "id": store_id, "trip_id": trip_id, "items.id": item_id },
            doc! { "$set": { "items.$.payers": bson::to_bson(&payers).unwrap() } },
            None,
        )
        .await
    {
        Ok(result) if result.matched_count == 0 => {
            HttpResponse::NotFound().body("Couldn't find the desired item")
        }
        Ok(_) => HttpResponse::Ok().body("Payers updated"),
        Err(err) => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

#[get("/trips/{trip_id}/stores/{store_id}/totals")]
async fn store_totals(
    client: web::Data<Client>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (trip_id, store_id) = path.into_inner();
    let stores = client.database("BeAnywhere").collection::<FoodStore>("Stores");
    let store = match stores
        .find_one(doc! { "id": store_id, "trip_id": trip_id }, None)
        .await
    {
        Ok(Some(store)) => store,
        Ok(None) => return HttpResponse::NotFound().body("Couldn't find the desired store"),
        Err(err) => return HttpResponse::InternalServerError().body(err.to_string()),
    };

    let total = grand_total(&store.items);
    let user_totals = totals_by_user(&store.items)
        .into_iter()
        .map(|(id, amount)| {
            let name = store
                .items
                .iter()
                .flat_map(|item| &item.payers)
                .find(|payer| payer.id == id)
                .map(|payer| payer.name.clone())
                .unwrap_or_default();
            let total = UserTotalJson {
                name,
                amount,
                formatted: format_currency(amount),
            };
            (id, total)
        })
        .collect();

    HttpResponse::Ok().json(StoreTotalsJson {
        grand_total: total,
        grand_total_formatted: format_currency(total),
        user_totals,
    })
}

// Marking a debtor paid is one-way and idempotent; there is no endpoint back
// to pending
#[post("/trips/{trip_id}/stores/{store_id}/debtors/{user_id}/paid")]
async fn mark_debtor_paid(
    client: web::Data<Client>,
    path: web::Path<(String, String, String)>,
) -> HttpResponse {
    let (trip_id, store_id, user_id) = path.into_inner();
    let stores = client.database("BeAnywhere").collection::<FoodStore>("Stores");
    match stores
        .update_one(
            doc! { "id": store_id, "trip_id": trip_id, "debtors.user.id": user_id },
            doc! { "$set": { "debtors.$.payment_status": "paid" } },
            None,
        )
        .await
    {
        Ok(result) if result.matched_count == 0 => {
            HttpResponse::NotFound().body("Couldn't find the desired debtor")
        }
        Ok(_) => HttpResponse::Ok().body("Debtor marked as paid"),
        Err(err) => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let uri = std::env::var("MONGODB_URI").expect("You need to add the MONGODB_URI to the env");
    std::env::var("APP_AUTH_SECRET").expect("You need to add the APP_AUTH_SECRET to the env");

    let client = Client::with_uri_str(uri).await.expect("failed to connect");
    info!("connected to the database");

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(web::Data::new(client.clone()))
            .service(add_trip)
            .service(add_member)
            .service(add_store)
            .service(list_stores)
            .service(add_item)
            .service(update_item_payers)
            .service(store_totals)
            .service(mark_debtor_paid)
    })
    .bind(("0.0.0.0", 8080))?
    .run()
    .await
}
