pub mod detail;
pub mod listing;
pub mod login;

use std::collections::HashMap;

use tokio::sync::mpsc::UnboundedSender;

use coursedesk_core::{ActionCoordinator, AdminClient, FilterDiscipline};

use crate::action::Action;
use crate::component::Component;
use crate::screen::ScreenId;

/// What every screen needs from the app: the API client, the shared
/// coordinator, listing settings, and the action channel.
#[derive(Clone)]
pub struct Services {
    pub client: AdminClient,
    pub coordinator: ActionCoordinator,
    pub discipline: FilterDiscipline,
    pub page_size: u32,
    pub action_tx: UnboundedSender<Action>,
}

/// Build every screen.
pub fn create_screens(services: &Services) -> HashMap<ScreenId, Box<dyn Component>> {
    let mut screens: HashMap<ScreenId, Box<dyn Component>> = HashMap::new();
    for id in ScreenId::ALL {
        if let Some(kind) = id.entity_kind() {
            screens.insert(id, Box::new(listing::ListingScreen::new(kind, services.clone())));
        }
    }
    screens.insert(
        ScreenId::Detail,
        Box::new(detail::DetailScreen::new(services.clone())),
    );
    screens.insert(
        ScreenId::Login,
        Box::new(login::LoginScreen::new(services.client.session().clone())),
    );
    screens
}
