//! Cart and checkout flows over the in-memory store.
//!
//! These run the same services the HTTP handlers use, with the store swapped
//! for `MemoryStore`, so they need no database.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use rust_decimal::Decimal;
use tokio::task::JoinSet;

use gallery_core::{
    Address, ArtworkId, CartError, OrderError, OrderStatus, PaymentMethod, Role, UserId,
};
use gallery_server::db::memory::MemoryStore;
use gallery_server::db::{OrderStore, RepositoryError};
use gallery_server::services::auth::Identity;
use gallery_server::services::cart::{CartLocks, CartService, CartServiceError};
use gallery_server::services::orders::{Checkout, OrderService, OrderServiceError, StatusChange};

const COLLECTOR: Identity = Identity {
    user_id: UserId::new(10),
    role: Role::User,
};
const CURATOR: Identity = Identity {
    user_id: UserId::new(1),
    role: Role::Admin,
};

fn shipping() -> Checkout {
    Checkout {
        shipping_address: Address {
            street: Some("12 Harbour Road".to_string()),
            city: Some("Lisbon".to_string()),
            state: None,
            zip_code: Some("1100-001".to_string()),
            country: Some("Portugal".to_string()),
        },
        payment_method: PaymentMethod::CreditCard,
        notes: Some("Please crate the canvas".to_string()),
    }
}

fn catalog() -> (MemoryStore, ArtworkId, ArtworkId) {
    let store = MemoryStore::new();
    let nocturne = store.put_artwork(1, "Nocturne in Blue", Decimal::new(120_000, 2));
    let harbour = store.put_artwork(2, "Harbour at Dawn", Decimal::new(45_050, 2));
    (store, nocturne, harbour)
}

#[tokio::test]
async fn test_browse_add_and_checkout() {
    let (store, nocturne, harbour) = catalog();
    let locks = CartLocks::new();
    let carts = CartService::new(store.clone(), store.clone(), &locks);
    let orders = OrderService::new(store.clone(), &locks);

    carts.add(COLLECTOR.user_id, nocturne, None).await.unwrap();
    carts.add(COLLECTOR.user_id, harbour, Some(2)).await.unwrap();
    let cart = carts.add(COLLECTOR.user_id, nocturne, Some(1)).await.unwrap();

    assert_eq!(cart.lines.len(), 2);
    assert_eq!(cart.line(nocturne).unwrap().quantity, 2);
    // 2 x 1200.00 + 2 x 450.50
    assert_eq!(cart.total, Decimal::new(330_100, 2));

    let order = orders.checkout(COLLECTOR, shipping()).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total, Decimal::new(330_100, 2));
    assert_eq!(order.lines.len(), 2);
    assert_eq!(order.user_id, COLLECTOR.user_id);

    let cart = carts.get(COLLECTOR.user_id).await.unwrap();
    assert!(cart.is_empty());
    assert_eq!(cart.total, Decimal::ZERO);
}

#[tokio::test]
async fn test_order_keeps_checkout_price_after_catalog_change() {
    let (store, nocturne, _) = catalog();
    let locks = CartLocks::new();
    let carts = CartService::new(store.clone(), store.clone(), &locks);
    let orders = OrderService::new(store.clone(), &locks);

    carts.add(COLLECTOR.user_id, nocturne, None).await.unwrap();
    let order = orders.checkout(COLLECTOR, shipping()).await.unwrap();

    store.put_artwork(1, "Nocturne in Blue", Decimal::new(999_900, 2));
    store.remove_artwork(nocturne);

    let fetched = orders.get(COLLECTOR, order.id).await.unwrap();
    assert_eq!(fetched.lines[0].price, Decimal::new(120_000, 2));
    assert_eq!(fetched.lines[0].title, "Nocturne in Blue");
}

#[tokio::test]
async fn test_checkout_rejects_empty_cart_and_incomplete_address() {
    let (store, nocturne, _) = catalog();
    let locks = CartLocks::new();
    let carts = CartService::new(store.clone(), store.clone(), &locks);
    let orders = OrderService::new(store.clone(), &locks);

    let err = orders.checkout(COLLECTOR, shipping()).await.unwrap_err();
    assert!(matches!(err, OrderServiceError::Order(OrderError::EmptyCart)));

    carts.add(COLLECTOR.user_id, nocturne, None).await.unwrap();
    let mut request = shipping();
    request.shipping_address.city = Some("   ".to_string());

    let err = orders.checkout(COLLECTOR, request).await.unwrap_err();
    assert!(matches!(err, OrderServiceError::IncompleteAddress));

    // Nothing was placed, the cart survives
    assert!(store.orders().is_empty());
    assert_eq!(store.cart(COLLECTOR.user_id).unwrap().lines.len(), 1);
}

#[tokio::test]
async fn test_cart_edge_cases() {
    let (store, nocturne, harbour) = catalog();
    let locks = CartLocks::new();
    let carts = CartService::new(store.clone(), store.clone(), &locks);

    let err = carts
        .add(COLLECTOR.user_id, ArtworkId::new(404), None)
        .await
        .unwrap_err();
    assert!(matches!(err, CartServiceError::ArtworkNotFound(_)));

    let err = carts
        .add(COLLECTOR.user_id, nocturne, Some(0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CartServiceError::Cart(CartError::InvalidQuantity(0))
    ));

    let err = carts.remove(COLLECTOR.user_id, harbour).await.unwrap_err();
    assert!(matches!(
        err,
        CartServiceError::Cart(CartError::LineNotFound(_))
    ));

    carts.add(COLLECTOR.user_id, nocturne, Some(3)).await.unwrap();
    let cart = carts.update(COLLECTOR.user_id, nocturne, 0).await.unwrap();
    assert!(cart.is_empty());
}

#[tokio::test]
async fn test_concurrent_adds_from_one_user_are_not_lost() {
    const WRITERS: u32 = 16;

    let (store, nocturne, _) = catalog();
    let locks = CartLocks::new();

    let mut tasks = JoinSet::new();
    for _ in 0..WRITERS {
        let store = store.clone();
        let locks = locks.clone();
        tasks.spawn(async move {
            CartService::new(store.clone(), store, &locks)
                .add(COLLECTOR.user_id, nocturne, None)
                .await
                .map(|_| ())
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    let cart = store.cart(COLLECTOR.user_id).unwrap();
    assert_eq!(cart.line(nocturne).unwrap().quantity, WRITERS);
    assert_eq!(
        cart.total,
        Decimal::new(120_000, 2) * Decimal::from(WRITERS)
    );
}

#[tokio::test]
async fn test_order_visibility_and_lifecycle() {
    let (store, nocturne, _) = catalog();
    let locks = CartLocks::new();
    let carts = CartService::new(store.clone(), store.clone(), &locks);
    let orders = OrderService::new(store.clone(), &locks);
    let stranger = Identity {
        user_id: UserId::new(11),
        role: Role::User,
    };

    carts.add(COLLECTOR.user_id, nocturne, None).await.unwrap();
    let order = orders.checkout(COLLECTOR, shipping()).await.unwrap();

    assert!(matches!(
        orders.get(stranger, order.id).await,
        Err(OrderServiceError::Forbidden)
    ));
    assert!(orders.list(stranger).await.unwrap().is_empty());
    assert_eq!(orders.list(CURATOR).await.unwrap().len(), 1);
    assert!(orders.get(CURATOR, order.id).await.is_ok());

    let shipped = orders
        .update_status(
            order.id,
            StatusChange {
                status: OrderStatus::Processing,
                tracking_number: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(shipped.status, OrderStatus::Processing);

    let shipped = orders
        .update_status(
            order.id,
            StatusChange {
                status: OrderStatus::Shipped,
                tracking_number: Some("PT123456789".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(shipped.tracking_number.as_deref(), Some("PT123456789"));

    let err = orders
        .update_status(
            order.id,
            StatusChange {
                status: OrderStatus::Pending,
                tracking_number: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderServiceError::Order(OrderError::IllegalTransition { .. })
    ));
}

#[tokio::test]
async fn test_add_update_checkout_scenario() {
    let store = MemoryStore::new();
    let artwork = store.put_artwork(7, "Still Life", Decimal::from(100));
    let locks = CartLocks::new();
    let carts = CartService::new(store.clone(), store.clone(), &locks);
    let orders = OrderService::new(store.clone(), &locks);

    carts.add(COLLECTOR.user_id, artwork, None).await.unwrap();
    let cart = carts.add(COLLECTOR.user_id, artwork, Some(2)).await.unwrap();
    assert_eq!(cart.line(artwork).unwrap().quantity, 3);
    assert_eq!(cart.total, Decimal::from(300));

    let cart = carts.update(COLLECTOR.user_id, artwork, 1).await.unwrap();
    assert_eq!(cart.total, Decimal::from(100));

    let order = orders.checkout(COLLECTOR, shipping()).await.unwrap();
    assert_eq!(order.lines.len(), 1);
    assert_eq!(order.lines[0].quantity, 1);
    assert_eq!(order.lines[0].price, Decimal::from(100));
    assert_eq!(order.total, Decimal::from(100));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(store.orders().len(), 1);

    let cart = store.cart(COLLECTOR.user_id).unwrap();
    assert!(cart.is_empty());
    assert_eq!(cart.total, Decimal::ZERO);
}

#[tokio::test]
async fn test_cancelled_order_stays_cancelled_against_stale_write() {
    let (store, nocturne, _) = catalog();
    let locks = CartLocks::new();
    let carts = CartService::new(store.clone(), store.clone(), &locks);
    let orders = OrderService::new(store.clone(), &locks);

    carts.add(COLLECTOR.user_id, nocturne, None).await.unwrap();
    let order = orders.checkout(COLLECTOR, shipping()).await.unwrap();

    // A curator read the order as pending, then someone else cancelled it
    let mut stale = orders.get(CURATOR, order.id).await.unwrap();
    orders
        .update_status(
            order.id,
            StatusChange {
                status: OrderStatus::Cancelled,
                tracking_number: None,
            },
        )
        .await
        .unwrap();

    stale.transition(OrderStatus::Processing, None).unwrap();
    let err = OrderStore::update_status(&store, &stale, OrderStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    let current = orders.get(CURATOR, order.id).await.unwrap();
    assert_eq!(current.status, OrderStatus::Cancelled);

    let err = orders
        .update_status(
            order.id,
            StatusChange {
                status: OrderStatus::Processing,
                tracking_number: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderServiceError::Order(OrderError::IllegalTransition { .. })
    ));
}

#[tokio::test]
async fn test_deleted_account_cannot_shop() {
    let (store, nocturne, _) = catalog();
    let locks = CartLocks::new();
    let carts = CartService::new(store.clone(), store.clone(), &locks);
    let orders = OrderService::new(store.clone(), &locks);

    carts.add(COLLECTOR.user_id, nocturne, None).await.unwrap();
    store.delete_user(COLLECTOR.user_id);

    assert!(matches!(
        carts.get(COLLECTOR.user_id).await,
        Err(CartServiceError::UnknownUser(id)) if id == COLLECTOR.user_id
    ));
    assert!(matches!(
        carts.add(COLLECTOR.user_id, nocturne, None).await,
        Err(CartServiceError::UnknownUser(_))
    ));
    assert!(matches!(
        orders.checkout(COLLECTOR, shipping()).await,
        Err(OrderServiceError::UnknownUser(_))
    ));
    assert!(store.orders().is_empty());
}

#[tokio::test]
async fn test_cart_total_cannot_outgrow_order_records() {
    let store = MemoryStore::new();
    let masterpiece = store.put_artwork(3, "The Unsellable", Decimal::new(100_000_000_000, 0));
    let locks = CartLocks::new();
    let carts = CartService::new(store.clone(), store.clone(), &locks);

    carts.add(COLLECTOR.user_id, masterpiece, Some(9)).await.unwrap();
    let err = carts
        .add(COLLECTOR.user_id, masterpiece, Some(1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CartServiceError::Cart(CartError::TotalTooLarge)
    ));

    let cart = store.cart(COLLECTOR.user_id).unwrap();
    assert_eq!(cart.line(masterpiece).unwrap().quantity, 9);
    assert!(cart.total <= gallery_core::Cart::MAX_TOTAL);
}
