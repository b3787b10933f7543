//! Role-specific menus and the state machine walking them.
//!
//! The navigator only decides what a selection means. Dispatching the
//! selected command is left to [`super::router::CommandRouter`].

use crate::domain::Role;

use super::router::Domain;

/// Option code meaning "back" in a submenu and "log out" at the top.
pub const BACK: &str = "0";

/// One numbered menu line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub code: &'static str,
    pub label: &'static str,
}

const fn item(code: &'static str, label: &'static str) -> MenuItem {
    MenuItem { code, label }
}

/// Submenus reachable from a top menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmenuKey {
    Collaborators,
    ManagedContracts,
    ManagedEvents,
    MyClients,
    MyContracts,
    ContractFilters,
}

impl SubmenuKey {
    /// Domain whose commands the submenu's options select.
    pub const fn domain(self) -> Domain {
        match self {
            Self::Collaborators => Domain::Collaborator,
            Self::ManagedContracts | Self::MyContracts => Domain::Contract,
            Self::ManagedEvents => Domain::Event,
            Self::MyClients => Domain::Client,
            Self::ContractFilters => Domain::ContractFilter,
        }
    }
}

/// A submenu's title and options.
#[derive(Debug, Clone, Copy)]
pub struct Submenu {
    pub key: SubmenuKey,
    pub title: &'static str,
    pub items: &'static [MenuItem],
}

/// A role's top menu.
#[derive(Debug, Clone, Copy)]
pub struct TopMenu {
    pub role: Role,
    pub title: &'static str,
    pub items: &'static [MenuItem],
}

/// Static menu tables.
///
/// Top-menu options are linked either to a submenu or to a direct action by
/// name; an option with neither link is reported as not found.
#[derive(Debug, Clone, Copy)]
pub struct Catalogue {
    pub top_menus: &'static [TopMenu],
    pub submenus: &'static [Submenu],
    pub submenu_links: &'static [(Role, &'static str, SubmenuKey)],
    pub direct_actions: &'static [(Role, &'static str, &'static str)],
}

impl Catalogue {
    /// Menus shipped with the console.
    pub const STANDARD: Self = Self {
        top_menus: &[
            TopMenu {
                role: Role::Gestion,
                title: "Management menu",
                items: &[
                    item("1", "Collaborators"),
                    item("2", "Contracts"),
                    item("3", "Events"),
                    item("4", "All clients"),
                    item(BACK, "Log out"),
                ],
            },
            TopMenu {
                role: Role::Commercial,
                title: "Sales menu",
                items: &[
                    item("1", "My clients"),
                    item("2", "Create a client"),
                    item("3", "My contracts"),
                    item("4", "Filter my contracts"),
                    item("5", "Create an event"),
                    item(BACK, "Log out"),
                ],
            },
            TopMenu {
                role: Role::Support,
                title: "Support menu",
                items: &[
                    item("1", "My events"),
                    item("2", "Update one of my events"),
                    item("3", "All clients"),
                    item("4", "All contracts"),
                    item(BACK, "Log out"),
                ],
            },
        ],
        submenus: &[
            Submenu {
                key: SubmenuKey::Collaborators,
                title: "Collaborators",
                items: &[
                    item("1", "Create a collaborator"),
                    item("2", "Update a collaborator"),
                    item("3", "Delete a collaborator"),
                    item("4", "List collaborators"),
                    item(BACK, "Back"),
                ],
            },
            Submenu {
                key: SubmenuKey::ManagedContracts,
                title: "Contracts",
                items: &[
                    item("1", "Create a contract"),
                    item("2", "Update a contract"),
                    item("3", "List all contracts"),
                    item(BACK, "Back"),
                ],
            },
            Submenu {
                key: SubmenuKey::ManagedEvents,
                title: "Events",
                items: &[
                    item("1", "Update an event"),
                    item("2", "Assign a support contact"),
                    item("3", "List all events"),
                    item("4", "List events without support"),
                    item(BACK, "Back"),
                ],
            },
            Submenu {
                key: SubmenuKey::MyClients,
                title: "My clients",
                items: &[
                    item("1", "List my clients"),
                    item("2", "Update a client"),
                    item("3", "Search clients by name"),
                    item(BACK, "Back"),
                ],
            },
            Submenu {
                key: SubmenuKey::MyContracts,
                title: "My contracts",
                items: &[
                    item("1", "List my contracts"),
                    item("2", "Update a contract"),
                    item("3", "Create a contract"),
                    item(BACK, "Back"),
                ],
            },
            Submenu {
                key: SubmenuKey::ContractFilters,
                title: "Filter my contracts",
                items: &[
                    item("1", "Unsigned contracts"),
                    item("2", "Contracts not fully paid"),
                    item("3", "Signed contracts"),
                    item(BACK, "Back"),
                ],
            },
        ],
        submenu_links: &[
            (Role::Gestion, "1", SubmenuKey::Collaborators),
            (Role::Gestion, "2", SubmenuKey::ManagedContracts),
            (Role::Gestion, "3", SubmenuKey::ManagedEvents),
            (Role::Commercial, "1", SubmenuKey::MyClients),
            (Role::Commercial, "3", SubmenuKey::MyContracts),
            (Role::Commercial, "4", SubmenuKey::ContractFilters),
        ],
        direct_actions: &[
            (Role::Gestion, "4", "list_all_clients"),
            (Role::Commercial, "2", "create_client"),
            (Role::Commercial, "5", "create_event"),
            (Role::Support, "1", "list_assigned_events"),
            (Role::Support, "2", "update_event"),
            (Role::Support, "3", "list_all_clients"),
            (Role::Support, "4", "list_all_contracts"),
        ],
    };

    fn top_menu(&self, role: Role) -> Option<&TopMenu> {
        self.top_menus.iter().find(|menu| menu.role == role)
    }

    fn submenu(&self, key: SubmenuKey) -> Option<&Submenu> {
        self.submenus.iter().find(|menu| menu.key == key)
    }

    fn submenu_for(&self, role: Role, code: &str) -> Option<SubmenuKey> {
        self.submenu_links
            .iter()
            .find(|(link_role, link_code, _)| *link_role == role && *link_code == code)
            .map(|(_, _, key)| *key)
    }

    fn direct_action_for(&self, role: Role, code: &str) -> Option<&'static str> {
        self.direct_actions
            .iter()
            .find(|(action_role, action_code, _)| *action_role == role && *action_code == code)
            .map(|(_, _, action)| *action)
    }
}

/// Where the navigator currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    TopMenu(Role),
    Submenu(SubmenuKey),
    LoggedOut,
}

/// What a selection asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Input is not one of the current menu's codes.
    Invalid,
    /// Valid top-menu code linked to nothing.
    NotFound,
    EnteredSubmenu(SubmenuKey),
    BackToTop,
    /// Submenu option to hand to the router.
    Dispatch { domain: Domain, option: String },
    /// Top-menu direct action to hand to the router.
    Direct(&'static str),
    LoggedOut,
}

/// Finite-state walker over one role's menus.
#[derive(Debug, Clone)]
pub struct MenuNavigator {
    role: Role,
    state: MenuState,
    catalogue: &'static Catalogue,
}

impl MenuNavigator {
    /// Navigator at the top menu for `role`, using the standard menus.
    pub fn new(role: Role) -> Self {
        Self::with_catalogue(role, &Catalogue::STANDARD)
    }

    /// Navigator over custom menu tables.
    pub fn with_catalogue(role: Role, catalogue: &'static Catalogue) -> Self {
        Self {
            role,
            state: MenuState::TopMenu(role),
            catalogue,
        }
    }

    /// Role whose menus are shown.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Current position in the menu tree.
    pub fn state(&self) -> MenuState {
        self.state
    }

    /// Heading of the current menu.
    pub fn title(&self) -> &'static str {
        match self.state {
            MenuState::TopMenu(role) => self
                .catalogue
                .top_menu(role)
                .map_or("Menu", |menu| menu.title),
            MenuState::Submenu(key) => self
                .catalogue
                .submenu(key)
                .map_or("Menu", |menu| menu.title),
            MenuState::LoggedOut => "Logged out",
        }
    }

    /// Options of the current menu, in display order.
    pub fn items(&self) -> &'static [MenuItem] {
        let catalogue: &'static Catalogue = self.catalogue;
        match self.state {
            MenuState::TopMenu(role) => catalogue
                .top_menu(role)
                .map(|menu| menu.items)
                .unwrap_or_default(),
            MenuState::Submenu(key) => catalogue
                .submenu(key)
                .map(|menu| menu.items)
                .unwrap_or_default(),
            MenuState::LoggedOut => &[],
        }
    }

    /// Apply one user selection and report what it means.
    pub fn select(&mut self, raw: &str) -> Selection {
        let code = raw.trim();
        if !self.items().iter().any(|entry| entry.code == code) {
            return Selection::Invalid;
        }
        match self.state {
            MenuState::TopMenu(role) => self.select_top(role, code),
            MenuState::Submenu(key) => {
                self.state = MenuState::TopMenu(self.role);
                if code == BACK {
                    Selection::BackToTop
                } else {
                    Selection::Dispatch {
                        domain: key.domain(),
                        option: code.to_owned(),
                    }
                }
            }
            MenuState::LoggedOut => Selection::LoggedOut,
        }
    }

    fn select_top(&mut self, role: Role, code: &str) -> Selection {
        if code == BACK {
            self.state = MenuState::LoggedOut;
            return Selection::LoggedOut;
        }
        if let Some(key) = self.catalogue.submenu_for(role, code) {
            self.state = MenuState::Submenu(key);
            return Selection::EnteredSubmenu(key);
        }
        self.catalogue
            .direct_action_for(role, code)
            .map_or(Selection::NotFound, Selection::Direct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    static SPARSE: Catalogue = Catalogue {
        top_menus: &[TopMenu {
            role: Role::Support,
            title: "Sparse",
            items: &[item("1", "Linked"), item("7", "Dangling"), item(BACK, "Log out")],
        }],
        submenus: &[],
        submenu_links: &[],
        direct_actions: &[(Role::Support, "1", "list_assigned_events")],
    };

    #[rstest]
    #[case(Role::Gestion, "1", Selection::EnteredSubmenu(SubmenuKey::Collaborators))]
    #[case(Role::Gestion, "4", Selection::Direct("list_all_clients"))]
    #[case(Role::Commercial, "4", Selection::EnteredSubmenu(SubmenuKey::ContractFilters))]
    #[case(Role::Commercial, "5", Selection::Direct("create_event"))]
    #[case(Role::Support, "2", Selection::Direct("update_event"))]
    #[case(Role::Support, "9", Selection::Invalid)]
    #[case(Role::Commercial, "", Selection::Invalid)]
    fn top_menu_selections(#[case] role: Role, #[case] raw: &str, #[case] expected: Selection) {
        let mut navigator = MenuNavigator::new(role);
        assert_eq!(navigator.select(raw), expected);
    }

    #[rstest]
    fn direct_actions_and_invalid_input_stay_at_the_top() {
        let mut navigator = MenuNavigator::new(Role::Support);

        navigator.select("3");
        assert_eq!(navigator.state(), MenuState::TopMenu(Role::Support));
        navigator.select("abc");
        assert_eq!(navigator.state(), MenuState::TopMenu(Role::Support));
    }

    #[rstest]
    fn zero_at_the_top_logs_out() {
        let mut navigator = MenuNavigator::new(Role::Gestion);

        assert_eq!(navigator.select(" 0 "), Selection::LoggedOut);
        assert_eq!(navigator.state(), MenuState::LoggedOut);
        assert!(navigator.items().is_empty());
        assert_eq!(navigator.select("1"), Selection::Invalid);
    }

    #[rstest]
    fn submenu_dispatch_returns_to_the_top() {
        let mut navigator = MenuNavigator::new(Role::Commercial);
        navigator.select("3");
        assert_eq!(navigator.state(), MenuState::Submenu(SubmenuKey::MyContracts));
        assert_eq!(navigator.title(), "My contracts");

        let selection = navigator.select("2");

        assert_eq!(
            selection,
            Selection::Dispatch {
                domain: Domain::Contract,
                option: "2".to_owned()
            }
        );
        assert_eq!(navigator.state(), MenuState::TopMenu(Role::Commercial));
    }

    #[rstest]
    fn submenu_back_and_invalid_input() {
        let mut navigator = MenuNavigator::new(Role::Gestion);
        navigator.select("3");

        assert_eq!(navigator.select("8"), Selection::Invalid);
        assert_eq!(navigator.state(), MenuState::Submenu(SubmenuKey::ManagedEvents));
        assert_eq!(navigator.select("0"), Selection::BackToTop);
        assert_eq!(navigator.state(), MenuState::TopMenu(Role::Gestion));
    }

    #[rstest]
    fn unlinked_top_option_is_not_found() {
        let mut navigator = MenuNavigator::with_catalogue(Role::Support, &SPARSE);

        assert_eq!(navigator.select("7"), Selection::NotFound);
        assert_eq!(navigator.state(), MenuState::TopMenu(Role::Support));
        assert_eq!(navigator.select("1"), Selection::Direct("list_assigned_events"));
    }

    #[rstest]
    fn every_standard_top_option_is_linked() {
        let catalogue = &Catalogue::STANDARD;
        for menu in catalogue.top_menus {
            for entry in menu.items.iter().filter(|entry| entry.code != BACK) {
                let linked = catalogue.submenu_for(menu.role, entry.code).is_some()
                    || catalogue.direct_action_for(menu.role, entry.code).is_some();
                assert!(linked, "{} option {} is unlinked", menu.role, entry.code);
            }
        }
    }
}
