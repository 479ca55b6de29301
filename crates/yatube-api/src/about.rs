use axum::Json;

use yatube_types::api::AboutPage;

pub async fn author() -> Json<AboutPage> {
    Json(AboutPage {
        title: "Очень простая страница".to_string(),
        text: "На создание этой страницы у меня ушло пять минут! Ай да я.".to_string(),
    })
}

pub async fn tech() -> Json<AboutPage> {
    Json(AboutPage {
        title: "Очень не простая страница".to_string(),
        text: "На создание этой страницы у меня ушло не пять минут! Ай да я.".to_string(),
    })
}
