mod bootstrap;
mod transition_service;
